use super::geometry::Point;
use super::types::{EdgeId, NodeId};

/// What a menu entry does when chosen. Executed by the canvas state.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasCommand {
	DeleteNode(NodeId),
	DeleteEdge(EdgeId),
	/// Ask the host for a new node; `at` is the world position under the click.
	AddNode { at: Point },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuAction {
	pub name: String,
	pub command: CanvasCommand,
}

impl MenuAction {
	pub fn new(name: impl Into<String>, command: CanvasCommand) -> Self {
		Self {
			name: name.into(),
			command,
		}
	}
}

/// Visibility, device-space anchor and the action list last handed to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextMenu {
	visible: bool,
	anchor: Point,
	actions: Vec<MenuAction>,
}

impl ContextMenu {
	pub fn show(&mut self, x: f64, y: f64) {
		self.anchor = Point::new(x, y);
		self.visible = true;
	}

	pub fn hide(&mut self) {
		self.actions.clear();
		self.anchor = Point::default();
		self.visible = false;
	}

	pub fn set_actions(&mut self, actions: Vec<MenuAction>) {
		self.actions = actions;
	}

	pub fn is_visible(&self) -> bool {
		self.visible
	}

	pub fn anchor(&self) -> Point {
		self.anchor
	}

	pub fn actions(&self) -> &[MenuAction] {
		&self.actions
	}
}
