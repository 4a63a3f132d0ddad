use log::{debug, info};

use super::config::CanvasConfig;
use super::context_menu::{CanvasCommand, ContextMenu, MenuAction};
use super::element::{ContextActions, Draggable, Hit};
use super::error::ModelError;
use super::geometry::{Bounds, ConnectorSide, Curve, Point};
use super::node::Node;
use super::surface::Surface;
use super::types::{EdgeId, Graph, NodeId, Project, ServiceDefinition};
use super::viewport::{Viewport, ZoomDirection};
use super::visual_graph::VisualGraph;

const GHOST_DASH: &[f64] = &[6.0, 4.0];

/// Mouse button identity, as reported by `MouseEvent.button`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
	Primary,
	Middle,
	Secondary,
	Other,
}

impl Button {
	pub fn from_dom(button: i16) -> Self {
		match button {
			0 => Self::Primary,
			1 => Self::Middle,
			2 => Self::Secondary,
			_ => Self::Other,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
	#[default]
	Default,
	Pointer,
	Grabbing,
	Crosshair,
}

impl Cursor {
	pub fn as_css(self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Pointer => "pointer",
			Self::Grabbing => "grabbing",
			Self::Crosshair => "crosshair",
		}
	}
}

/// Where the pointer gesture currently stands.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	/// `anchor` is the press position minus the offset at press time.
	Panning { anchor: Point },
	DraggingElement { node: NodeId },
	ConnectingEdge { source: NodeId, side: ConnectorSide },
}

/// Requests from the engine to its host.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
	SetCursor(Cursor),
	/// The graph changed in a way worth persisting.
	ScheduleSave,
	/// Menu visibility or contents changed.
	MenuChanged,
	/// Ask the user for a new node; it will be placed at `at` (world space).
	RequestNode { at: Point },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
	Created(EdgeId),
	Duplicate,
	SelfConnection,
	MissingNode,
}

/// Everything the canvas knows: the live graph, the view, the gesture in
/// progress and the context menu. Pointer input arrives in device space.
pub struct CanvasState {
	pub graph: VisualGraph,
	pub viewport: Viewport,
	pub menu: ContextMenu,
	pub config: CanvasConfig,
	gesture: Gesture,
	ghost: Option<Curve>,
	last_pointer: Point,
	pub width: f64,
	pub height: f64,
}

impl CanvasState {
	pub fn new(graph: VisualGraph, config: CanvasConfig, width: f64, height: f64) -> Self {
		Self {
			graph,
			viewport: Viewport::new(&config),
			menu: ContextMenu::default(),
			config,
			gesture: Gesture::Idle,
			ghost: None,
			last_pointer: Point::default(),
			width,
			height,
		}
	}

	pub fn from_project(
		project: &Project,
		config: CanvasConfig,
		width: f64,
		height: f64,
	) -> Result<Self, ModelError> {
		let graph = VisualGraph::from_graph(&project.graph, &config)?;
		info!(
			"loaded project `{}` ({} nodes, {} edges)",
			project.name,
			graph.node_count(),
			graph.edges().len()
		);
		Ok(Self::new(graph, config, width, height))
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn gesture(&self) -> &Gesture {
		&self.gesture
	}

	/// The uncommitted curve of a connection in progress.
	pub fn ghost(&self) -> Option<&Curve> {
		self.ghost.as_ref()
	}

	pub fn last_pointer_world(&self) -> Point {
		self.viewport.screen_to_world(self.last_pointer)
	}

	pub fn snapshot(&self) -> Graph {
		Graph::from_visual_graph(&self.graph)
	}

	pub fn hit_test<S: Surface + ?Sized>(&self, surface: &mut S, screen: Point) -> Option<Hit> {
		let world = self.viewport.screen_to_world(screen);
		self.graph.hit_test(surface, world, &self.config)
	}

	pub fn on_pointer_down<S: Surface + ?Sized>(
		&mut self,
		surface: &mut S,
		screen: Point,
		button: Button,
	) -> Vec<Effect> {
		self.last_pointer = screen;
		let mut effects = Vec::new();

		match button {
			Button::Middle => {
				effects.extend(self.settle_gesture());
				self.begin_pan(screen);
				effects.push(Effect::SetCursor(Cursor::Grabbing));
				return effects;
			}
			Button::Primary => {}
			_ => return effects,
		}

		if self.menu.is_visible() {
			self.menu.hide();
			effects.push(Effect::MenuChanged);
		}

		let hit = self.hit_test(surface, screen);
		let world = self.viewport.screen_to_world(screen);

		if let Gesture::ConnectingEdge { source, side } = std::mem::take(&mut self.gesture) {
			self.ghost = None;
			match hit {
				Some(Hit::Connector { node: target, .. }) if target != source => {
					if let ConnectOutcome::Created(_) = self.connect(&source, side, &target) {
						effects.push(Effect::ScheduleSave);
					}
				}
				Some(Hit::Connector { .. }) => {
					debug!("connection from `{source}` released on its own node, ignoring");
				}
				_ => debug!("connection from `{source}` cancelled"),
			}
			effects.push(Effect::SetCursor(self.hover_cursor(surface, screen)));
			return effects;
		}

		match hit {
			Some(Hit::Connector { node, side }) => {
				if let Some(origin) = self.graph.node(&node) {
					self.ghost = Some(
						Curve::new(origin.connector(side).center, world).dashed(GHOST_DASH),
					);
				}
				self.gesture = Gesture::ConnectingEdge { source: node, side };
				effects.push(Effect::SetCursor(Cursor::Crosshair));
			}
			Some(Hit::Node(id)) => {
				if let Some(node) = self.graph.node_mut(&id) {
					node.on_drag_start(world);
				}
				self.gesture = Gesture::DraggingElement { node: id };
				effects.push(Effect::SetCursor(Cursor::Grabbing));
			}
			Some(Hit::Edge(_)) => {}
			None => {
				self.begin_pan(screen);
				effects.push(Effect::SetCursor(Cursor::Grabbing));
			}
		}
		effects
	}

	/// Finish whatever gesture is running so a pan can take over: a drag is
	/// committed and saved, a pending connection is dropped.
	fn settle_gesture(&mut self) -> Vec<Effect> {
		let mut effects = Vec::new();
		match std::mem::take(&mut self.gesture) {
			Gesture::DraggingElement { node } => {
				if let Some(node) = self.graph.node_mut(&node) {
					node.on_drag_end();
				}
				effects.push(Effect::ScheduleSave);
			}
			Gesture::ConnectingEdge { source, .. } => {
				debug!("connection from `{source}` cancelled by pan");
				self.graph.clear_hover();
			}
			Gesture::Panning { .. } | Gesture::Idle => {}
		}
		self.ghost = None;
		effects
	}

	fn begin_pan(&mut self, screen: Point) {
		self.gesture = Gesture::Panning {
			anchor: self.viewport.pan_anchor(screen),
		};
	}

	pub fn on_pointer_move<S: Surface + ?Sized>(&mut self, surface: &mut S, screen: Point) -> Vec<Effect> {
		self.last_pointer = screen;
		let world = self.viewport.screen_to_world(screen);

		match &self.gesture {
			Gesture::Panning { anchor } => {
				let anchor = *anchor;
				self.viewport.pan_to(anchor, screen);
				Vec::new()
			}
			Gesture::DraggingElement { node } => {
				let id = node.clone();
				if let Some(node) = self.graph.node_mut(&id) {
					node.on_drag_move(world);
				}
				Vec::new()
			}
			Gesture::ConnectingEdge { .. } => {
				if let Some(ghost) = self.ghost.as_mut() {
					ghost.end = world;
				}
				self.graph.update_hover(surface, world, &self.config);
				vec![Effect::SetCursor(Cursor::Crosshair)]
			}
			Gesture::Idle => vec![Effect::SetCursor(self.hover_cursor(surface, screen))],
		}
	}

	fn hover_cursor<S: Surface + ?Sized>(&mut self, surface: &mut S, screen: Point) -> Cursor {
		let world = self.viewport.screen_to_world(screen);
		if self.graph.update_hover(surface, world, &self.config) {
			Cursor::Pointer
		} else {
			Cursor::Default
		}
	}

	/// Ends panning and dragging. A connection stays open until the next press.
	pub fn on_pointer_up(&mut self) -> Vec<Effect> {
		let mut effects = Vec::new();
		match std::mem::take(&mut self.gesture) {
			Gesture::DraggingElement { node } => {
				if let Some(node) = self.graph.node_mut(&node) {
					node.on_drag_end();
				}
				effects.push(Effect::ScheduleSave);
				effects.push(Effect::SetCursor(Cursor::Pointer));
			}
			Gesture::Panning { .. } => effects.push(Effect::SetCursor(Cursor::Default)),
			connecting @ Gesture::ConnectingEdge { .. } => self.gesture = connecting,
			Gesture::Idle => {}
		}
		effects
	}

	/// The pointer left the canvas: drop every gesture and all hover state.
	pub fn on_pointer_leave(&mut self) -> Vec<Effect> {
		let mut effects = self.on_pointer_up();
		self.gesture = Gesture::Idle;
		self.ghost = None;
		self.graph.clear_hover();
		effects.retain(|effect| !matches!(effect, Effect::SetCursor(_)));
		effects.push(Effect::SetCursor(Cursor::Default));
		effects
	}

	/// Secondary click: cancel any connection, then open the menu for whatever
	/// is under the pointer.
	pub fn on_context_menu<S: Surface + ?Sized>(&mut self, surface: &mut S, screen: Point) -> Vec<Effect> {
		self.last_pointer = screen;
		if matches!(self.gesture, Gesture::ConnectingEdge { .. }) {
			self.gesture = Gesture::Idle;
		}
		self.ghost = None;

		let actions = match self.hit_test(surface, screen) {
			Some(Hit::Node(id) | Hit::Connector { node: id, .. }) => {
				self.graph.node(&id).map(ContextActions::actions)
			}
			Some(Hit::Edge(id)) => self.graph.edge(&id).map(ContextActions::actions),
			None => None,
		}
		.unwrap_or_else(|| {
			vec![MenuAction::new(
				"Add Node",
				CanvasCommand::AddNode {
					at: self.viewport.screen_to_world(screen),
				},
			)]
		});

		self.menu.set_actions(actions);
		self.menu.show(screen.x, screen.y);
		vec![Effect::MenuChanged]
	}

	pub fn on_wheel(&mut self, screen: Point, delta_y: f64) -> Vec<Effect> {
		self.last_pointer = screen;
		self.viewport
			.zoom_at(screen, ZoomDirection::from_wheel(delta_y));
		Vec::new()
	}

	/// Execute a menu entry. The menu closes either way.
	pub fn run_command(&mut self, command: CanvasCommand) -> Vec<Effect> {
		self.menu.hide();
		let mut effects = match command {
			CanvasCommand::DeleteNode(id) => self.delete_node(&id),
			CanvasCommand::DeleteEdge(id) => self.delete_edge(&id),
			CanvasCommand::AddNode { at } => {
				self.last_pointer = self.viewport.world_to_screen(at);
				vec![Effect::RequestNode { at }]
			}
		};
		effects.push(Effect::MenuChanged);
		effects
	}

	/// Add a node at the last known pointer position.
	pub fn create_node(
		&mut self,
		label: impl Into<String>,
		service_definition: ServiceDefinition,
	) -> (NodeId, Vec<Effect>) {
		let at = self.last_pointer_world();
		let id = NodeId::generate();
		let bounds = Bounds::new(at.x, at.y, self.config.node_width, self.config.node_height);
		let node = Node::new(id.clone(), bounds, label, &self.config)
			.with_service_definition(service_definition);
		self.graph.add_node(node);
		(id, vec![Effect::ScheduleSave])
	}

	pub fn delete_node(&mut self, id: &NodeId) -> Vec<Effect> {
		if self.graph.remove_node(id).is_none() {
			return Vec::new();
		}
		match &self.gesture {
			Gesture::DraggingElement { node } | Gesture::ConnectingEdge { source: node, .. }
				if node == id =>
			{
				self.gesture = Gesture::Idle;
				self.ghost = None;
			}
			_ => {}
		}
		vec![Effect::ScheduleSave]
	}

	pub fn delete_edge(&mut self, id: &EdgeId) -> Vec<Effect> {
		match self.graph.remove_edge(id) {
			Some(_) => vec![Effect::ScheduleSave],
			None => Vec::new(),
		}
	}

	/// Close a connection that started on `source`'s `side` connector at
	/// `target`. Grabbing the outbound connector links source -> target;
	/// grabbing the inbound one links target -> source.
	pub fn connect(&mut self, source: &NodeId, side: ConnectorSide, target: &NodeId) -> ConnectOutcome {
		if source == target {
			debug!("rejecting self-connection on `{source}`");
			return ConnectOutcome::SelfConnection;
		}
		let (from, to) = match side {
			ConnectorSide::Out => (source, target),
			ConnectorSide::In => (target, source),
		};
		if self.graph.node(from).is_none() || self.graph.node(to).is_none() {
			return ConnectOutcome::MissingNode;
		}
		if self.graph.has_edge(from, to) {
			debug!("edge {from} -> {to} already exists");
			return ConnectOutcome::Duplicate;
		}
		match self.graph.add_edge(from.clone(), to.clone()) {
			Some(id) => {
				info!("connected {from} -> {to}");
				ConnectOutcome::Created(id)
			}
			None => ConnectOutcome::MissingNode,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram_canvas::element::Hoverable;
	use crate::components::diagram_canvas::surface::HeadlessSurface;

	fn state() -> CanvasState {
		let config = CanvasConfig::default();
		let mut graph = VisualGraph::new();
		graph.add_node(Node::new("a".into(), Bounds::new(0.0, 0.0, 100.0, 50.0), "", &config));
		graph.add_node(Node::new("b".into(), Bounds::new(300.0, 0.0, 100.0, 50.0), "", &config));
		CanvasState::new(graph, config, 800.0, 600.0)
	}

	#[test]
	fn press_on_empty_space_pans() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(500.0, 400.0), Button::Primary);
		assert!(matches!(s.gesture(), Gesture::Panning { .. }));
		s.on_pointer_move(&mut surface, Point::new(520.0, 390.0));
		assert_eq!(s.viewport.offset(), Point::new(20.0, -10.0));
		s.on_pointer_up();
		assert_eq!(s.gesture(), &Gesture::Idle);
	}

	#[test]
	fn drag_moves_node_and_schedules_save_on_release() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(50.0, 20.0), Button::Primary);
		assert_eq!(s.gesture(), &Gesture::DraggingElement { node: "a".into() });
		s.on_pointer_move(&mut surface, Point::new(80.0, 60.0));
		assert_eq!(s.graph.node(&"a".into()).unwrap().position(), Point::new(30.0, 40.0));
		let effects = s.on_pointer_up();
		assert!(effects.contains(&Effect::ScheduleSave));
		assert_eq!(s.gesture(), &Gesture::Idle);
	}

	#[test]
	fn stray_pointer_up_is_harmless() {
		let mut s = state();
		assert!(s.on_pointer_up().is_empty());
		assert_eq!(s.gesture(), &Gesture::Idle);
	}

	#[test]
	fn ghost_curve_tracks_the_pointer() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(100.0, 25.0), Button::Primary);
		s.on_pointer_up();
		s.on_pointer_move(&mut surface, Point::new(200.0, 300.0));
		let ghost = s.ghost().unwrap();
		assert_eq!(ghost.start, Point::new(100.0, 25.0));
		assert_eq!(ghost.end, Point::new(200.0, 300.0));
	}

	#[test]
	fn pressing_elsewhere_cancels_a_connection() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(100.0, 25.0), Button::Primary);
		s.on_pointer_down(&mut surface, Point::new(600.0, 500.0), Button::Primary);
		assert_eq!(s.gesture(), &Gesture::Idle);
		assert!(s.ghost().is_none());
		assert!(s.graph.edges().is_empty());
	}

	#[test]
	fn context_menu_targets_the_element_under_the_pointer() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_context_menu(&mut surface, Point::new(50.0, 20.0));
		assert!(s.menu.is_visible());
		assert_eq!(
			s.menu.actions()[0].command,
			CanvasCommand::DeleteNode("a".into())
		);

		s.on_context_menu(&mut surface, Point::new(600.0, 500.0));
		assert_eq!(s.menu.actions()[0].name, "Add Node");
		assert_eq!(s.menu.anchor(), Point::new(600.0, 500.0));
	}

	#[test]
	fn right_click_clears_a_pending_connection() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(100.0, 25.0), Button::Primary);
		s.on_context_menu(&mut surface, Point::new(600.0, 500.0));
		assert_eq!(s.gesture(), &Gesture::Idle);
		assert!(s.ghost().is_none());
	}

	#[test]
	fn add_node_command_places_the_node_where_the_menu_opened() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.viewport.set(2.0, Point::new(100.0, 0.0));
		s.on_context_menu(&mut surface, Point::new(500.0, 400.0));
		let command = s.menu.actions()[0].command.clone();
		s.on_pointer_move(&mut surface, Point::new(0.0, 0.0));
		let effects = s.run_command(command);
		assert!(effects.contains(&Effect::RequestNode {
			at: Point::new(200.0, 200.0)
		}));
		assert!(!s.menu.is_visible());

		let (id, effects) = s.create_node("cache", ServiceDefinition::default());
		assert_eq!(effects, vec![Effect::ScheduleSave]);
		let node = s.graph.node(&id).unwrap();
		assert_eq!(node.position(), Point::new(200.0, 200.0));
		assert_eq!(node.bounds().width, 175.0);
	}

	#[test]
	fn leaving_the_canvas_resets_everything() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_move(&mut surface, Point::new(50.0, 20.0));
		assert!(s.graph.node(&"a".into()).unwrap().is_hovered());
		s.on_pointer_down(&mut surface, Point::new(100.0, 25.0), Button::Primary);
		s.on_pointer_leave();
		assert_eq!(s.gesture(), &Gesture::Idle);
		assert!(s.ghost().is_none());
		assert!(!s.graph.node(&"a".into()).unwrap().is_hovered());
	}

	#[test]
	fn deleting_the_dragged_node_ends_the_drag() {
		let mut s = state();
		let mut surface = HeadlessSurface::default();
		s.on_pointer_down(&mut surface, Point::new(50.0, 20.0), Button::Primary);
		assert_eq!(s.delete_node(&"a".into()), vec![Effect::ScheduleSave]);
		assert_eq!(s.gesture(), &Gesture::Idle);
		assert!(s.delete_node(&"a".into()).is_empty());
	}
}
