use super::config::CanvasConfig;
use super::context_menu::{CanvasCommand, MenuAction};
use super::element::{ContextActions, Draggable, Hoverable};
use super::error::ModelError;
use super::geometry::{Bounds, Connector, ConnectorSide, Point};
use super::surface::Surface;
use super::types::{GraphNode, NodeId, ServiceDefinition};

pub const LABEL_FONT: &str = "bold 16px Arial";
const CORNER_RADIUS: f64 = 10.0;
const BASE_HEIGHT: f64 = 36.0;
const LINE_HEIGHT: f64 = 16.0;
const LINE_SPACING: f64 = 18.0;
const BLOCK_CENTERING: f64 = 7.25;

/// A labeled service box with an inbound and an outbound connector.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	bounds: Bounds,
	pub label: String,
	pub color: String,
	pub font_color: String,
	pub service_definition: ServiceDefinition,
	in_connector: Connector,
	out_connector: Connector,
	hovered: bool,
	drag_offset: Point,
}

impl Node {
	pub fn new(id: NodeId, bounds: Bounds, label: impl Into<String>, config: &CanvasConfig) -> Self {
		let color = config.node_color.clone();
		Self {
			id,
			bounds,
			label: label.into(),
			in_connector: Connector::new(bounds.left_mid(), config.connector_radius, &color),
			out_connector: Connector::new(bounds.right_mid(), config.connector_radius, &color),
			color,
			font_color: config.font_color.clone(),
			service_definition: ServiceDefinition::default(),
			hovered: false,
			drag_offset: Point::default(),
		}
	}

	pub fn with_color(mut self, color: impl Into<String>) -> Self {
		self.color = color.into();
		self.in_connector.color = self.color.clone();
		self.out_connector.color = self.color.clone();
		self
	}

	pub fn with_service_definition(mut self, definition: ServiceDefinition) -> Self {
		self.service_definition = definition;
		self
	}

	pub fn from_graph_node(node: &GraphNode, config: &CanvasConfig) -> Result<Self, ModelError> {
		node.validate()?;
		Ok(Self::new(
			node.id.clone(),
			Bounds::new(node.x, node.y, node.width, node.height),
			node.label.clone(),
			config,
		)
		.with_color(node.color.clone())
		.with_service_definition(node.service_definition.clone()))
	}

	pub fn to_graph_node(&self) -> GraphNode {
		GraphNode {
			id: self.id.clone(),
			x: self.bounds.x,
			y: self.bounds.y,
			width: self.bounds.width,
			height: self.bounds.height,
			label: self.label.clone(),
			color: self.color.clone(),
			service_definition: self.service_definition.clone(),
		}
	}

	/// Rebuild a node from its persisted JSON object. Missing fields are an
	/// error, never defaulted.
	pub fn from_json(json: serde_json::Value, config: &CanvasConfig) -> Result<Self, ModelError> {
		let node: GraphNode = serde_json::from_value(json)?;
		Self::from_graph_node(&node, config)
	}

	pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
		Ok(serde_json::to_value(self.to_graph_node())?)
	}

	pub fn bounds(&self) -> Bounds {
		self.bounds
	}

	pub fn position(&self) -> Point {
		self.bounds.origin()
	}

	pub fn set_position(&mut self, p: Point) {
		self.bounds.x = p.x;
		self.bounds.y = p.y;
		self.sync_connectors();
	}

	pub fn set_height(&mut self, height: f64) {
		self.bounds.height = height;
		self.sync_connectors();
	}

	pub fn connector(&self, side: ConnectorSide) -> &Connector {
		match side {
			ConnectorSide::In => &self.in_connector,
			ConnectorSide::Out => &self.out_connector,
		}
	}

	fn sync_connectors(&mut self) {
		self.in_connector.center = self.bounds.left_mid();
		self.out_connector.center = self.bounds.right_mid();
	}

	/// Body containment against the current (post-layout) height.
	pub fn contains_point(&self, p: Point, top_tolerance: f64) -> bool {
		self.bounds.contains(p, top_tolerance)
	}

	pub fn connector_at(&self, p: Point) -> Option<ConnectorSide> {
		if self.in_connector.contains_point(p) {
			Some(ConnectorSide::In)
		} else if self.out_connector.contains_point(p) {
			Some(ConnectorSide::Out)
		} else {
			None
		}
	}

	/// Wrap the label into half the node width and grow the height to fit.
	/// Returns the wrapped lines; an empty label leaves the height alone.
	pub fn layout_label<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Vec<String> {
		if self.label.is_empty() {
			return Vec::new();
		}
		surface.set_font(LABEL_FONT);
		let lines = wrap_label(surface, &self.label, self.bounds.width / 2.0);
		self.set_height(BASE_HEIGHT + lines.len() as f64 * LINE_HEIGHT);
		lines
	}

	pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
		let lines = self.layout_label(surface);
		let b = self.bounds;

		surface.set_shadow("rgba(0, 0, 0, 0.2)", 10.0, Point::new(5.0, 5.0));
		surface.set_fill_style(&self.color);
		rounded_rect(surface, b, CORNER_RADIUS);
		surface.fill();
		surface.set_shadow("transparent", 0.0, Point::default());

		surface.set_stroke_style("white");
		surface.set_line_width(if self.hovered { 2.0 } else { 1.0 });
		surface.stroke();

		if self.hovered {
			self.in_connector.draw(surface);
			self.out_connector.draw(surface);
		}

		let n = lines.len();
		let block_offset = if n > 1 { n as f64 * BLOCK_CENTERING } else { LINE_SPACING };
		surface.set_fill_style(&self.font_color);
		surface.set_font(LABEL_FONT);
		surface.set_text_centered();
		for (index, line) in lines.iter().enumerate() {
			let line_offset = if n > 1 { index as f64 * LINE_SPACING } else { LINE_SPACING };
			let at = Point::new(
				b.x + b.width / 2.0,
				b.y + b.height / 2.0 + line_offset - block_offset,
			);
			surface.fill_text(line, at);
		}
	}
}

impl Hoverable for Node {
	fn on_hover(&mut self) {
		self.hovered = true;
	}

	fn hover_off(&mut self) {
		self.hovered = false;
	}

	fn is_hovered(&self) -> bool {
		self.hovered
	}
}

impl Draggable for Node {
	fn on_drag_start(&mut self, world: Point) {
		self.drag_offset = Point::new(world.x - self.bounds.x, world.y - self.bounds.y);
	}

	fn on_drag_move(&mut self, world: Point) {
		self.set_position(Point::new(
			world.x - self.drag_offset.x,
			world.y - self.drag_offset.y,
		));
	}

	fn on_drag_end(&mut self) {
		self.drag_offset = Point::default();
	}
}

impl ContextActions for Node {
	fn actions(&self) -> Vec<MenuAction> {
		vec![MenuAction::new(
			"Delete node",
			CanvasCommand::DeleteNode(self.id.clone()),
		)]
	}
}

/// Greedy word wrap: a word moves to a new line when appending it (plus a
/// trailing space) would measure wider than `max_width`.
pub fn wrap_label<S: Surface + ?Sized>(surface: &S, text: &str, max_width: f64) -> Vec<String> {
	let mut lines = Vec::new();
	let mut line = String::new();
	for word in text.split(' ') {
		let candidate = format!("{line}{word} ");
		if !line.is_empty() && surface.measure_text(&candidate) > max_width {
			lines.push(line.trim_end().to_owned());
			line = format!("{word} ");
		} else {
			line = candidate;
		}
	}
	lines.push(line.trim_end().to_owned());
	lines
}

fn rounded_rect<S: Surface + ?Sized>(surface: &mut S, b: Bounds, r: f64) {
	let (right, bottom) = (b.x + b.width, b.y + b.height);
	surface.begin_path();
	surface.move_to(Point::new(b.x + r, b.y));
	surface.line_to(Point::new(right - r, b.y));
	surface.quadratic_curve_to(Point::new(right, b.y), Point::new(right, b.y + r));
	surface.line_to(Point::new(right, bottom - r));
	surface.quadratic_curve_to(Point::new(right, bottom), Point::new(right - r, bottom));
	surface.line_to(Point::new(b.x + r, bottom));
	surface.quadratic_curve_to(Point::new(b.x, bottom), Point::new(b.x, bottom - r));
	surface.line_to(Point::new(b.x, b.y + r));
	surface.quadratic_curve_to(Point::new(b.x, b.y), Point::new(b.x + r, b.y));
	surface.close_path();
}
