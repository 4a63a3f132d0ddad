use std::f64::consts::PI;

use super::surface::Surface;

/// A point in either world or device space; which one is up to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Position and size shared by every positionable element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Bounds {
	pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn origin(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn left_mid(&self) -> Point {
		Point::new(self.x, self.y + self.height / 2.0)
	}

	pub fn right_mid(&self) -> Point {
		Point::new(self.x + self.width, self.y + self.height / 2.0)
	}

	/// Closed-rectangle containment. `top_tolerance` extends the top edge
	/// upwards so thin targets are easier to grab.
	pub fn contains(&self, p: Point, top_tolerance: f64) -> bool {
		p.x >= self.x
			&& p.x <= self.x + self.width
			&& p.y >= self.y - top_tolerance
			&& p.y <= self.y + self.height
	}
}

/// Which end of a node a connector sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectorSide {
	/// Left-middle, where incoming edges land.
	In,
	/// Right-middle, where outgoing edges leave.
	Out,
}

/// Circular link point anchored to a node edge. Derived from the owning
/// node's bounds and rebuilt whenever they change.
#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
	pub center: Point,
	pub radius: f64,
	pub color: String,
}

impl Connector {
	pub fn new(center: Point, radius: f64, color: impl Into<String>) -> Self {
		Self {
			center,
			radius,
			color: color.into(),
		}
	}

	pub fn contains_point(&self, p: Point) -> bool {
		self.center.distance(p) < self.radius
	}

	pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
		surface.set_fill_style(&self.color);
		surface.begin_path();
		surface.arc(self.center, self.radius);
		surface.fill();

		surface.begin_path();
		surface.arc(self.center, self.radius + 1.0);
		surface.stroke();
	}
}

/// Cubic bezier between two connector positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
	pub start: Point,
	pub end: Point,
	pub color: String,
	pub width: f64,
	pub dash: Vec<f64>,
	pub selected: bool,
}

impl Curve {
	pub const DEFAULT_WIDTH: f64 = 3.0;

	pub fn new(start: Point, end: Point) -> Self {
		Self {
			start,
			end,
			color: "#fff".into(),
			width: Self::DEFAULT_WIDTH,
			dash: Vec::new(),
			selected: false,
		}
	}

	pub fn dashed(mut self, dash: &[f64]) -> Self {
		self.dash = dash.to_vec();
		self
	}

	/// Horizontal S-curve: both control points sit at the horizontal midpoint,
	/// the first level with the start and the second level with the end.
	pub fn control_points(&self) -> (Point, Point) {
		let mid_x = self.start.x + (self.end.x - self.start.x) * 0.5;
		(
			Point::new(mid_x, self.start.y),
			Point::new(mid_x, self.end.y),
		)
	}

	/// Replace the surface's current path with this curve.
	pub fn trace<S: Surface + ?Sized>(&self, surface: &mut S) {
		let (c1, c2) = self.control_points();
		surface.begin_path();
		surface.move_to(self.start);
		surface.bezier_curve_to(c1, c2, self.end);
	}

	pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
		if self.selected {
			surface.set_stroke_style("#f00");
			surface.set_line_width(self.width + 5.0);
		} else {
			surface.set_stroke_style(&self.color);
			surface.set_line_width(self.width);
		}
		surface.set_line_dash(&self.dash);
		self.trace(surface);
		surface.stroke();
		surface.set_line_dash(&[]);
	}

	/// Stroke containment with a widened pick region. The path is traced into
	/// the surface first because the query runs against its current path.
	pub fn contains_point<S: Surface + ?Sized>(
		&self,
		surface: &mut S,
		p: Point,
		padding: f64,
	) -> bool {
		surface.set_line_width(self.width + padding);
		surface.set_line_dash(&self.dash);
		self.trace(surface);
		let hit = surface.is_point_in_stroke(p);
		surface.set_line_dash(&[]);
		hit
	}
}

/// Evaluate a cubic bezier at `t` in `[0, 1]`.
pub fn cubic_at(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
	let u = 1.0 - t;
	let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
	Point::new(
		a * p0.x + b * c1.x + c * c2.x + d * p1.x,
		a * p0.y + b * c1.y + c * c2.y + d * p1.y,
	)
}

/// Evaluate a quadratic bezier at `t` in `[0, 1]`.
pub fn quadratic_at(p0: Point, c: Point, p1: Point, t: f64) -> Point {
	let u = 1.0 - t;
	Point::new(
		u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
		u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
	)
}

/// Point on a circle at `angle` radians.
pub fn circle_at(center: Point, radius: f64, angle: f64) -> Point {
	Point::new(
		center.x + radius * angle.cos(),
		center.y + radius * angle.sin(),
	)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq == 0.0 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

pub(crate) const FULL_TURN: f64 = 2.0 * PI;
