use super::config::CanvasConfig;
use super::geometry::Point;
use super::surface::Surface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
	In,
	Out,
}

impl ZoomDirection {
	/// Wheel convention: scrolling up (negative delta) zooms in.
	pub fn from_wheel(delta_y: f64) -> Self {
		if delta_y < 0.0 { Self::In } else { Self::Out }
	}
}

/// Device <-> world mapping: `world = (device - offset) / scale`.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	scale: f64,
	offset: Point,
	min_scale: f64,
	max_scale: f64,
	zoom_factor: f64,
}

impl Viewport {
	pub fn new(config: &CanvasConfig) -> Self {
		Self {
			scale: 1.0_f64.clamp(config.min_scale, config.max_scale),
			offset: Point::default(),
			min_scale: config.min_scale,
			max_scale: config.max_scale,
			zoom_factor: config.zoom_factor,
		}
	}

	pub fn scale(&self) -> f64 {
		self.scale
	}

	pub fn offset(&self) -> Point {
		self.offset
	}

	/// Place the view directly; `scale` is clamped into bounds.
	pub fn set(&mut self, scale: f64, offset: Point) {
		self.scale = scale.clamp(self.min_scale, self.max_scale);
		self.offset = offset;
	}

	pub fn screen_to_world(&self, p: Point) -> Point {
		Point::new(
			(p.x - self.offset.x) / self.scale,
			(p.y - self.offset.y) / self.scale,
		)
	}

	pub fn world_to_screen(&self, p: Point) -> Point {
		Point::new(
			p.x * self.scale + self.offset.x,
			p.y * self.scale + self.offset.y,
		)
	}

	/// One zoom step anchored at `pointer` (device space): the world point
	/// under the pointer stays under it. Returns false when already at the
	/// bound in the requested direction.
	pub fn zoom_at(&mut self, pointer: Point, direction: ZoomDirection) -> bool {
		let next = match direction {
			ZoomDirection::In if self.scale >= self.max_scale => return false,
			ZoomDirection::Out if self.scale <= self.min_scale => return false,
			ZoomDirection::In => self.scale * self.zoom_factor,
			ZoomDirection::Out => self.scale / self.zoom_factor,
		};
		let world = self.screen_to_world(pointer);
		self.scale = next.clamp(self.min_scale, self.max_scale);
		self.offset = Point::new(
			pointer.x - world.x * self.scale,
			pointer.y - world.y * self.scale,
		);
		true
	}

	/// Anchor for a pan gesture pressed at `pointer`.
	pub fn pan_anchor(&self, pointer: Point) -> Point {
		Point::new(pointer.x - self.offset.x, pointer.y - self.offset.y)
	}

	/// Move the view so the pan anchor sits under `pointer` again.
	pub fn pan_to(&mut self, anchor: Point, pointer: Point) {
		self.offset = Point::new(pointer.x - anchor.x, pointer.y - anchor.y);
	}

	/// Translate then scale, so subsequent drawing is in world space.
	pub fn apply<S: Surface + ?Sized>(&self, surface: &mut S) {
		surface.translate(self.offset.x, self.offset.y);
		surface.scale(self.scale);
	}
}
