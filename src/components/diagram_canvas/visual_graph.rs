use std::collections::HashMap;

use log::warn;

use super::config::CanvasConfig;
use super::edge::Edge;
use super::element::{Hit, Hoverable};
use super::error::ModelError;
use super::geometry::Point;
use super::node::Node;
use super::surface::Surface;
use super::types::{EdgeId, Graph, NodeId};

/// Live, interactive projection of a [`Graph`].
///
/// Nodes live in an id-keyed arena with a separate draw order; edges refer to
/// nodes by id only, so removing a node can never leave a dangling reference.
#[derive(Clone, Debug, Default)]
pub struct VisualGraph {
	nodes: HashMap<NodeId, Node>,
	order: Vec<NodeId>,
	edges: Vec<Edge>,
}

impl VisualGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build live elements from a persisted graph. Edges whose endpoints are
	/// missing (or that loop back onto their node) are dropped; malformed or
	/// duplicate nodes are an error.
	pub fn from_graph(graph: &Graph, config: &CanvasConfig) -> Result<Self, ModelError> {
		let mut visual = Self::new();
		for stored in &graph.nodes {
			if visual.nodes.contains_key(&stored.id) {
				return Err(ModelError::DuplicateNode(stored.id.0.clone()));
			}
			visual.insert(Node::from_graph_node(stored, config)?);
		}
		for stored in &graph.edges {
			if stored.from == stored.to {
				warn!("dropping self-loop edge on `{}`", stored.from);
				continue;
			}
			if !visual.nodes.contains_key(&stored.from) || !visual.nodes.contains_key(&stored.to) {
				warn!("dropping dangling edge {} -> {}", stored.from, stored.to);
				continue;
			}
			visual
				.edges
				.push(Edge::new(stored.from.clone(), stored.to.clone()));
		}
		Ok(visual)
	}

	/// Snapshot for persistence, in draw order.
	pub fn to_graph(&self) -> Graph {
		Graph::new(
			self.nodes().map(Node::to_graph_node).collect(),
			self.edges.iter().map(Edge::to_graph_edge).collect(),
		)
	}

	fn insert(&mut self, node: Node) {
		self.order.push(node.id.clone());
		self.nodes.insert(node.id.clone(), node);
	}

	/// Nodes bottom to top.
	pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
		self.order.iter().filter_map(|id| self.nodes.get(id))
	}

	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(id)
	}

	pub fn node_count(&self) -> usize {
		self.order.len()
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
		self.edges.iter().find(|edge| &edge.id == id)
	}

	/// Adds `node` on top. Returns false (and changes nothing) if the id is taken.
	pub fn add_node(&mut self, node: Node) -> bool {
		if self.nodes.contains_key(&node.id) {
			warn!("node `{}` already exists", node.id);
			return false;
		}
		self.insert(node);
		true
	}

	/// Removes the node and, in the same step, every edge that touches it.
	pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
		let node = self.nodes.remove(id)?;
		self.order.retain(|other| other != id);
		self.edges.retain(|edge| &edge.from != id && &edge.to != id);
		Some(node)
	}

	pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
		self.edges
			.iter()
			.any(|edge| &edge.from == from && &edge.to == to)
	}

	/// Inserts `from -> to` unless it would be a self-loop, reference a
	/// missing node, or duplicate an edge in the same direction.
	pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Option<EdgeId> {
		if from == to
			|| !self.nodes.contains_key(&from)
			|| !self.nodes.contains_key(&to)
			|| self.has_edge(&from, &to)
		{
			return None;
		}
		let edge = Edge::new(from, to);
		let id = edge.id.clone();
		self.edges.push(edge);
		Some(id)
	}

	pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
		let index = self.edges.iter().position(|edge| &edge.id == id)?;
		Some(self.edges.remove(index))
	}

	pub fn endpoints(&self, edge: &Edge) -> Option<(&Node, &Node)> {
		Some((self.nodes.get(&edge.from)?, self.nodes.get(&edge.to)?))
	}

	/// Topmost element under a world-space point: nodes last-added first
	/// (connectors before bodies), then edges.
	pub fn hit_test<S: Surface + ?Sized>(
		&self,
		surface: &mut S,
		p: Point,
		config: &CanvasConfig,
	) -> Option<Hit> {
		for node in self.nodes().rev() {
			if let Some(side) = node.connector_at(p) {
				return Some(Hit::Connector {
					node: node.id.clone(),
					side,
				});
			}
			if node.contains_point(p, config.hit_top_tolerance) {
				return Some(Hit::Node(node.id.clone()));
			}
		}
		self.edges
			.iter()
			.rev()
			.find(|edge| self.edge_contains(edge, surface, p, config))
			.map(|edge| Hit::Edge(edge.id.clone()))
	}

	fn edge_contains<S: Surface + ?Sized>(
		&self,
		edge: &Edge,
		surface: &mut S,
		p: Point,
		config: &CanvasConfig,
	) -> bool {
		self.endpoints(edge).is_some_and(|(start, end)| {
			edge.contains_point(start, end, surface, p, config.edge_pick_padding)
		})
	}

	/// Hover every element under `p`, clear the rest. Returns whether anything
	/// is hovered.
	pub fn update_hover<S: Surface + ?Sized>(
		&mut self,
		surface: &mut S,
		p: Point,
		config: &CanvasConfig,
	) -> bool {
		let mut any = false;
		for node in self.nodes.values_mut() {
			if node.connector_at(p).is_some() || node.contains_point(p, config.hit_top_tolerance) {
				node.on_hover();
				any = true;
			} else {
				node.hover_off();
			}
		}
		let hovered: Vec<bool> = self
			.edges
			.iter()
			.map(|edge| self.edge_contains(edge, surface, p, config))
			.collect();
		for (edge, hit) in self.edges.iter_mut().zip(hovered) {
			if hit {
				edge.on_hover();
				any = true;
			} else {
				edge.hover_off();
			}
		}
		any
	}

	pub fn clear_hover(&mut self) {
		self.nodes.values_mut().for_each(Hoverable::hover_off);
		self.edges.iter_mut().for_each(Hoverable::hover_off);
	}

	/// Recompute every node's label-driven height.
	pub fn layout<S: Surface + ?Sized>(&mut self, surface: &mut S) {
		for id in &self.order {
			if let Some(node) = self.nodes.get_mut(id) {
				node.layout_label(surface);
			}
		}
	}

	/// Edges first so nodes sit on top of them.
	pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
		self.layout(surface);
		for edge in &self.edges {
			if let Some((start, end)) = self.endpoints(edge) {
				edge.draw(start, end, surface);
			}
		}
		for id in &self.order {
			if let Some(node) = self.nodes.get_mut(id) {
				node.draw(surface);
			}
		}
	}
}

impl Graph {
	pub fn from_visual_graph(graph: &VisualGraph) -> Self {
		graph.to_graph()
	}
}
