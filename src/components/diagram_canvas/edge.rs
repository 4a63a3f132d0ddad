use super::context_menu::{CanvasCommand, MenuAction};
use super::element::{ContextActions, Hoverable};
use super::geometry::{ConnectorSide, Curve, Point};
use super::node::Node;
use super::surface::Surface;
use super::types::{EdgeId, GraphEdge, NodeId};

/// Directed link between two nodes, stored by id. The endpoints are looked up
/// in the owning graph whenever the edge is drawn or hit-tested.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: EdgeId,
	pub from: NodeId,
	pub to: NodeId,
	selected: bool,
}

impl Edge {
	pub fn new(from: NodeId, to: NodeId) -> Self {
		Self {
			id: EdgeId::between(&from, &to),
			from,
			to,
			selected: false,
		}
	}

	pub fn to_graph_edge(&self) -> GraphEdge {
		GraphEdge {
			from: self.from.clone(),
			to: self.to.clone(),
		}
	}

	/// From the start node's outbound connector to the end node's inbound one.
	pub fn curve(&self, start: &Node, end: &Node) -> Curve {
		let mut curve = Curve::new(
			start.connector(ConnectorSide::Out).center,
			end.connector(ConnectorSide::In).center,
		);
		curve.selected = self.selected;
		curve
	}

	pub fn contains_point<S: Surface + ?Sized>(
		&self,
		start: &Node,
		end: &Node,
		surface: &mut S,
		p: Point,
		padding: f64,
	) -> bool {
		self.curve(start, end).contains_point(surface, p, padding)
	}

	pub fn draw<S: Surface + ?Sized>(&self, start: &Node, end: &Node, surface: &mut S) {
		self.curve(start, end).draw(surface);
	}
}

impl Hoverable for Edge {
	fn on_hover(&mut self) {
		self.selected = true;
	}

	fn hover_off(&mut self) {
		self.selected = false;
	}

	fn is_hovered(&self) -> bool {
		self.selected
	}
}

impl ContextActions for Edge {
	fn actions(&self) -> Vec<MenuAction> {
		vec![MenuAction::new(
			"Delete edge",
			CanvasCommand::DeleteEdge(self.id.clone()),
		)]
	}
}
