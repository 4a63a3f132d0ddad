use super::context_menu::MenuAction;
use super::geometry::{ConnectorSide, Point};
use super::types::{EdgeId, NodeId};

/// Elements that react to the pointer resting over them.
pub trait Hoverable {
	fn on_hover(&mut self);
	fn hover_off(&mut self);
	fn is_hovered(&self) -> bool;
}

/// Elements the pointer can pick up and move. Coordinates are world space.
pub trait Draggable {
	fn on_drag_start(&mut self, world: Point);
	fn on_drag_move(&mut self, world: Point);
	fn on_drag_end(&mut self);
}

/// Elements that supply their own context-menu entries.
pub trait ContextActions {
	fn actions(&self) -> Vec<MenuAction>;
}

/// What a world-space point landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
	Connector { node: NodeId, side: ConnectorSide },
	Node(NodeId),
	Edge(EdgeId),
}
