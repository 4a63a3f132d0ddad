use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ModelError;

/// Stable node identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
	pub fn generate() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

/// Identifies an edge by its ordered endpoints. Unique per direction, so it
/// doubles as the dedup key. Displays as `"{from}-{to}"`, which is only a
/// label: node ids may themselves contain `-`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId {
	pub from: NodeId,
	pub to: NodeId,
}

impl EdgeId {
	pub fn between(from: &NodeId, to: &NodeId) -> Self {
		Self {
			from: from.clone(),
			to: to.clone(),
		}
	}
}

impl fmt::Display for EdgeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.from, self.to)
	}
}

/// Container metadata attached to a node. The canvas carries it through
/// untouched; unknown keys survive a load/save cycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefinition {
	pub image: String,
	pub ports: Vec<u16>,
	pub environment: BTreeMap<String, String>,
	pub volumes: Vec<String>,
	pub networks: Vec<String>,
	pub command: String,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	pub id: NodeId,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub label: String,
	pub color: String,
	#[serde(default)]
	pub service_definition: ServiceDefinition,
}

impl GraphNode {
	/// Reject nodes the canvas cannot place.
	pub fn validate(&self) -> Result<(), ModelError> {
		if self.id.0.is_empty() {
			return Err(ModelError::EmptyNodeId);
		}
		for (field, value) in [
			("x", self.x),
			("y", self.y),
			("width", self.width),
			("height", self.height),
		] {
			if !value.is_finite() {
				return Err(ModelError::NonFiniteGeometry {
					id: self.id.0.clone(),
					field,
					value,
				});
			}
		}
		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub from: NodeId,
	pub to: NodeId,
}

/// Persisted graph. Edges are not deduplicated here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default)]
	pub edges: Vec<GraphEdge>,
}

impl Graph {
	pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
		Self { nodes, edges }
	}

	pub fn from_json(json: &str) -> Result<Self, ModelError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String, ModelError> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn add_node(&mut self, node: GraphNode) {
		self.nodes.push(node);
	}

	/// Removes the node and every edge touching it.
	pub fn remove_node(&mut self, id: &NodeId) {
		self.nodes.retain(|node| &node.id != id);
		self.edges.retain(|edge| &edge.from != id && &edge.to != id);
	}

	pub fn add_edge(&mut self, edge: GraphEdge) {
		self.edges.push(edge);
	}

	/// Removes the first edge matching `edge`.
	pub fn remove_edge(&mut self, edge: &GraphEdge) {
		if let Some(index) = self.edges.iter().position(|e| e == edge) {
			self.edges.remove(index);
		}
	}

	pub fn is_connected(&self, from: &NodeId, to: &NodeId) -> bool {
		self.edges
			.iter()
			.any(|edge| &edge.from == from && &edge.to == to)
	}
}

/// A named, timestamped graph: one persisted record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
	pub id: String,
	pub name: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default)]
	pub graph: Graph,
}

impl Project {
	pub fn new(name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4().to_string(),
			name: name.into(),
			created_at: now,
			updated_at: now,
			graph: Graph::default(),
		}
	}

	pub fn from_json(json: &str) -> Result<Self, ModelError> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String, ModelError> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const PROJECT: &str = r##"{
		"id": "p1",
		"name": "shop",
		"createdAt": "2024-03-01T10:00:00Z",
		"updatedAt": "2024-03-02T10:00:00Z",
		"graph": {
			"nodes": [
				{"id": "a", "x": 0, "y": 0, "width": 175, "height": 50, "label": "api",
				 "color": "#444", "serviceDefinition": {"image": "api:1", "ports": [8080],
				 "environment": {"RUST_LOG": "info"}, "healthcheck": {"interval": "5s"}}},
				{"id": "b", "x": 300, "y": 0, "width": 175, "height": 50, "label": "db",
				 "color": "#444"}
			],
			"edges": [{"from": "a", "to": "b"}]
		}
	}"##;

	#[test]
	fn parses_project_json() {
		let project = Project::from_json(PROJECT).unwrap();
		assert_eq!(project.name, "shop");
		assert_eq!(project.graph.nodes.len(), 2);
		let api = &project.graph.nodes[0].service_definition;
		assert_eq!(api.image, "api:1");
		assert_eq!(api.ports, vec![8080]);
		assert_eq!(api.environment["RUST_LOG"], "info");
		assert_eq!(
			project.graph.nodes[1].service_definition,
			ServiceDefinition::default()
		);
	}

	#[test]
	fn unknown_service_fields_survive_a_round_trip() {
		let project = Project::from_json(PROJECT).unwrap();
		let json = project.to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(
			value["graph"]["nodes"][0]["serviceDefinition"]["healthcheck"]["interval"],
			"5s"
		);
		assert_eq!(value["createdAt"], "2024-03-01T10:00:00Z");
	}

	#[test]
	fn missing_required_field_is_an_error() {
		let json = r##"{"nodes": [{"id": "a", "x": 0, "y": 0, "width": 1, "height": 1, "color": "#444"}]}"##;
		let err = Graph::from_json(json).unwrap_err();
		assert!(err.to_string().contains("label"), "{err}");
	}

	#[test]
	fn remove_node_cascades_to_edges() {
		let mut graph = Project::from_json(PROJECT).unwrap().graph;
		graph.add_edge(GraphEdge {
			from: "b".into(),
			to: "a".into(),
		});
		graph.remove_node(&"b".into());
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn storage_keeps_parallel_edges() {
		let mut graph = Graph::default();
		let edge = GraphEdge {
			from: "a".into(),
			to: "b".into(),
		};
		graph.add_edge(edge.clone());
		graph.add_edge(edge.clone());
		assert_eq!(graph.edges.len(), 2);
		graph.remove_edge(&edge);
		assert_eq!(graph.edges.len(), 1);
		assert!(graph.is_connected(&"a".into(), &"b".into()));
		assert!(!graph.is_connected(&"b".into(), &"a".into()));
	}

	#[test]
	fn validate_rejects_non_finite_geometry() {
		let node = GraphNode {
			id: "a".into(),
			x: f64::NAN,
			y: 0.0,
			width: 1.0,
			height: 1.0,
			label: String::new(),
			color: "#444".into(),
			service_definition: ServiceDefinition::default(),
		};
		assert!(matches!(
			node.validate(),
			Err(ModelError::NonFiniteGeometry { field: "x", .. })
		));
	}
}
