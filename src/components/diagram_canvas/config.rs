/// Tunables for the canvas engine.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	/// Multiplier applied per wheel step.
	pub zoom_factor: f64,
	/// Extra grab area above each node's top edge. Zero makes containment strict.
	pub hit_top_tolerance: f64,
	pub connector_radius: f64,
	/// Added to an edge's stroke width when picking it.
	pub edge_pick_padding: f64,
	pub node_width: f64,
	pub node_height: f64,
	pub node_color: String,
	pub font_color: String,
	pub background: String,
	pub grid_size: f64,
}

impl Default for CanvasConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.5,
			max_scale: 5.0,
			zoom_factor: 1.1,
			hit_top_tolerance: 10.0,
			connector_radius: 10.0,
			edge_pick_padding: 5.0,
			node_width: 175.0,
			node_height: 50.0,
			node_color: "#444".into(),
			font_color: "#fff".into(),
			background: "#333".into(),
			grid_size: 50.0,
		}
	}
}
