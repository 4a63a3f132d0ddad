//! The drawing/measuring seam between the engine and a 2D canvas.
//!
//! Everything the engine draws or measures goes through [`Surface`], so hit
//! tests that depend on text metrics or stroke geometry behave the same in
//! the browser and under test.

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::{FULL_TURN, Point, circle_at, cubic_at, distance_to_segment, quadratic_at};

/// The subset of the 2D canvas API used by the engine.
pub trait Surface {
	fn save(&mut self);
	fn restore(&mut self);
	fn translate(&mut self, x: f64, y: f64);
	fn scale(&mut self, k: f64);

	fn clear(&mut self, width: f64, height: f64);
	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

	fn set_fill_style(&mut self, style: &str);
	fn set_stroke_style(&mut self, style: &str);
	fn set_line_width(&mut self, width: f64);
	fn set_line_dash(&mut self, segments: &[f64]);
	fn set_shadow(&mut self, color: &str, blur: f64, offset: Point);

	fn begin_path(&mut self);
	fn move_to(&mut self, p: Point);
	fn line_to(&mut self, p: Point);
	fn quadratic_curve_to(&mut self, control: Point, end: Point);
	fn bezier_curve_to(&mut self, c1: Point, c2: Point, end: Point);
	/// Full circle as a new subpath.
	fn arc(&mut self, center: Point, radius: f64);
	fn close_path(&mut self);
	fn fill(&mut self);
	fn stroke(&mut self);

	fn set_font(&mut self, font: &str);
	/// Center-aligned, middle baseline.
	fn set_text_centered(&mut self);
	fn fill_text(&mut self, text: &str, at: Point);
	/// Advance width of `text` in the current font.
	fn measure_text(&self, text: &str) -> f64;

	/// Whether `p` (in untransformed surface coordinates) lies on the current
	/// path when stroked with the current line width.
	fn is_point_in_stroke(&self, p: Point) -> bool;
}

type Ctx = CanvasRenderingContext2d;

impl Surface for CanvasRenderingContext2d {
	fn save(&mut self) {
		Ctx::save(self);
	}

	fn restore(&mut self) {
		Ctx::restore(self);
	}

	fn translate(&mut self, x: f64, y: f64) {
		let _ = Ctx::translate(self, x, y);
	}

	fn scale(&mut self, k: f64) {
		let _ = Ctx::scale(self, k, k);
	}

	fn clear(&mut self, width: f64, height: f64) {
		Ctx::clear_rect(self, 0.0, 0.0, width, height);
	}

	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
		Ctx::fill_rect(self, x, y, width, height);
	}

	fn set_fill_style(&mut self, style: &str) {
		Ctx::set_fill_style_str(self, style);
	}

	fn set_stroke_style(&mut self, style: &str) {
		Ctx::set_stroke_style_str(self, style);
	}

	fn set_line_width(&mut self, width: f64) {
		Ctx::set_line_width(self, width);
	}

	fn set_line_dash(&mut self, segments: &[f64]) {
		let dash: js_sys::Array = segments.iter().copied().map(JsValue::from_f64).collect();
		let _ = Ctx::set_line_dash(self, &dash);
	}

	fn set_shadow(&mut self, color: &str, blur: f64, offset: Point) {
		Ctx::set_shadow_color(self, color);
		Ctx::set_shadow_blur(self, blur);
		Ctx::set_shadow_offset_x(self, offset.x);
		Ctx::set_shadow_offset_y(self, offset.y);
	}

	fn begin_path(&mut self) {
		Ctx::begin_path(self);
	}

	fn move_to(&mut self, p: Point) {
		Ctx::move_to(self, p.x, p.y);
	}

	fn line_to(&mut self, p: Point) {
		Ctx::line_to(self, p.x, p.y);
	}

	fn quadratic_curve_to(&mut self, control: Point, end: Point) {
		Ctx::quadratic_curve_to(self, control.x, control.y, end.x, end.y);
	}

	fn bezier_curve_to(&mut self, c1: Point, c2: Point, end: Point) {
		Ctx::bezier_curve_to(self, c1.x, c1.y, c2.x, c2.y, end.x, end.y);
	}

	fn arc(&mut self, center: Point, radius: f64) {
		let _ = Ctx::arc(self, center.x, center.y, radius, 0.0, FULL_TURN);
	}

	fn close_path(&mut self) {
		Ctx::close_path(self);
	}

	fn fill(&mut self) {
		Ctx::fill(self);
	}

	fn stroke(&mut self) {
		Ctx::stroke(self);
	}

	fn set_font(&mut self, font: &str) {
		Ctx::set_font(self, font);
	}

	fn set_text_centered(&mut self) {
		Ctx::set_text_align(self, "center");
		Ctx::set_text_baseline(self, "middle");
	}

	fn fill_text(&mut self, text: &str, at: Point) {
		let _ = Ctx::fill_text(self, text, at.x, at.y);
	}

	fn measure_text(&self, text: &str) -> f64 {
		Ctx::measure_text(self, text)
			.map(|metrics| metrics.width())
			.unwrap_or(0.0)
	}

	fn is_point_in_stroke(&self, p: Point) -> bool {
		Ctx::is_point_in_stroke_with_x_and_y(self, p.x, p.y)
	}
}

const CURVE_STEPS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Transform {
	tx: f64,
	ty: f64,
	k: f64,
}

impl Transform {
	const IDENTITY: Self = Self {
		tx: 0.0,
		ty: 0.0,
		k: 1.0,
	};

	fn apply(&self, p: Point) -> Point {
		Point::new(self.tx + p.x * self.k, self.ty + p.y * self.k)
	}
}

#[derive(Clone, Copy, Debug)]
struct DrawState {
	transform: Transform,
	line_width: f64,
}

/// Text drawn onto a [`HeadlessSurface`], in surface coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnText {
	pub text: String,
	pub at: Point,
}

/// Browserless [`Surface`]: monospace text metrics, flattened paths and
/// geometric stroke containment. Records drawn text and stroke/fill counts
/// for the current frame.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
	char_width: f64,
	state: DrawState,
	stack: Vec<DrawState>,
	subpaths: Vec<Vec<Point>>,
	/// Text drawn since the last [`Surface::clear`].
	pub texts: Vec<DrawnText>,
	pub strokes: usize,
	pub fills: usize,
}

impl HeadlessSurface {
	/// `char_width` is the advance of every character, spaces included.
	pub fn new(char_width: f64) -> Self {
		Self {
			char_width,
			state: DrawState {
				transform: Transform::IDENTITY,
				line_width: 1.0,
			},
			stack: Vec::new(),
			subpaths: Vec::new(),
			texts: Vec::new(),
			strokes: 0,
			fills: 0,
		}
	}

	fn cursor(&self) -> Option<Point> {
		self.subpaths.last().and_then(|path| path.last().copied())
	}

	fn push_point(&mut self, p: Point) {
		match self.subpaths.last_mut() {
			Some(path) => path.push(p),
			None => self.subpaths.push(vec![p]),
		}
	}
}

impl Default for HeadlessSurface {
	fn default() -> Self {
		Self::new(8.0)
	}
}

impl Surface for HeadlessSurface {
	fn save(&mut self) {
		self.stack.push(self.state);
	}

	fn restore(&mut self) {
		if let Some(state) = self.stack.pop() {
			self.state = state;
		}
	}

	fn translate(&mut self, x: f64, y: f64) {
		let t = &mut self.state.transform;
		t.tx += x * t.k;
		t.ty += y * t.k;
	}

	fn scale(&mut self, k: f64) {
		self.state.transform.k *= k;
	}

	fn clear(&mut self, _width: f64, _height: f64) {
		self.texts.clear();
		self.strokes = 0;
		self.fills = 0;
	}

	fn fill_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
		self.fills += 1;
	}

	fn set_fill_style(&mut self, _style: &str) {}

	fn set_stroke_style(&mut self, _style: &str) {}

	fn set_line_width(&mut self, width: f64) {
		self.state.line_width = width;
	}

	fn set_line_dash(&mut self, _segments: &[f64]) {}

	fn set_shadow(&mut self, _color: &str, _blur: f64, _offset: Point) {}

	fn begin_path(&mut self) {
		self.subpaths.clear();
	}

	fn move_to(&mut self, p: Point) {
		let p = self.state.transform.apply(p);
		self.subpaths.push(vec![p]);
	}

	fn line_to(&mut self, p: Point) {
		let p = self.state.transform.apply(p);
		self.push_point(p);
	}

	fn quadratic_curve_to(&mut self, control: Point, end: Point) {
		let t = self.state.transform;
		let (c, end) = (t.apply(control), t.apply(end));
		let start = self.cursor().unwrap_or(c);
		for step in 1..=CURVE_STEPS {
			let s = step as f64 / CURVE_STEPS as f64;
			self.push_point(quadratic_at(start, c, end, s));
		}
	}

	fn bezier_curve_to(&mut self, c1: Point, c2: Point, end: Point) {
		let t = self.state.transform;
		let (c1, c2, end) = (t.apply(c1), t.apply(c2), t.apply(end));
		let start = self.cursor().unwrap_or(c1);
		for step in 1..=CURVE_STEPS {
			let s = step as f64 / CURVE_STEPS as f64;
			self.push_point(cubic_at(start, c1, c2, end, s));
		}
	}

	fn arc(&mut self, center: Point, radius: f64) {
		let t = self.state.transform;
		let (center, radius) = (t.apply(center), radius * t.k);
		let ring = (0..=CURVE_STEPS)
			.map(|step| circle_at(center, radius, FULL_TURN * step as f64 / CURVE_STEPS as f64))
			.collect();
		self.subpaths.push(ring);
	}

	fn close_path(&mut self) {
		if let Some(path) = self.subpaths.last_mut()
			&& let Some(&first) = path.first()
		{
			path.push(first);
		}
	}

	fn fill(&mut self) {
		self.fills += 1;
	}

	fn stroke(&mut self) {
		self.strokes += 1;
	}

	fn set_font(&mut self, _font: &str) {}

	fn set_text_centered(&mut self) {}

	fn fill_text(&mut self, text: &str, at: Point) {
		self.texts.push(DrawnText {
			text: text.to_owned(),
			at: self.state.transform.apply(at),
		});
	}

	fn measure_text(&self, text: &str) -> f64 {
		text.chars().count() as f64 * self.char_width
	}

	fn is_point_in_stroke(&self, p: Point) -> bool {
		let half = self.state.line_width * self.state.transform.k / 2.0;
		self.subpaths.iter().any(|path| {
			path.windows(2)
				.any(|seg| distance_to_segment(p, seg[0], seg[1]) <= half)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn measures_monospace() {
		let surface = HeadlessSurface::new(8.0);
		assert_eq!(surface.measure_text("abc "), 32.0);
	}

	#[test]
	fn stroke_containment_uses_line_width() {
		let mut surface = HeadlessSurface::default();
		surface.begin_path();
		surface.move_to(Point::new(0.0, 0.0));
		surface.line_to(Point::new(100.0, 0.0));
		surface.set_line_width(8.0);
		assert!(surface.is_point_in_stroke(Point::new(50.0, 3.9)));
		assert!(!surface.is_point_in_stroke(Point::new(50.0, 4.1)));
	}

	#[test]
	fn begin_path_discards_previous_path() {
		let mut surface = HeadlessSurface::default();
		surface.begin_path();
		surface.move_to(Point::new(0.0, 0.0));
		surface.line_to(Point::new(100.0, 0.0));
		surface.begin_path();
		surface.move_to(Point::new(0.0, 50.0));
		surface.line_to(Point::new(100.0, 50.0));
		assert!(!surface.is_point_in_stroke(Point::new(50.0, 0.0)));
		assert!(surface.is_point_in_stroke(Point::new(50.0, 50.0)));
	}

	#[test]
	fn paths_are_recorded_through_the_transform() {
		let mut surface = HeadlessSurface::default();
		surface.save();
		surface.translate(10.0, 20.0);
		surface.scale(2.0);
		surface.begin_path();
		surface.move_to(Point::new(0.0, 0.0));
		surface.line_to(Point::new(10.0, 0.0));
		assert!(surface.is_point_in_stroke(Point::new(20.0, 20.0)));
		surface.restore();
		surface.fill_text("x", Point::new(1.0, 1.0));
		assert_eq!(surface.texts[0].at, Point::new(1.0, 1.0));
	}
}
