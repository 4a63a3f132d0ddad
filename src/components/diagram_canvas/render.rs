use super::state::CanvasState;
use super::surface::Surface;

const GRID_DOT: f64 = 2.0;
const GRID_DOT_COLOR: &str = "rgba(255, 255, 255, 0.15)";

/// Draw one frame: background, grid, edges, nodes, then any pending
/// connection on top.
pub fn render<S: Surface + ?Sized>(state: &mut CanvasState, surface: &mut S) {
	surface.clear(state.width, state.height);
	surface.set_fill_style(&state.config.background);
	surface.fill_rect(0.0, 0.0, state.width, state.height);
	draw_grid(state, surface);

	surface.save();
	state.viewport.apply(surface);
	state.graph.draw(surface);
	if let Some(ghost) = state.ghost() {
		ghost.draw(surface);
	}
	surface.restore();
}

/// Device-space dot grid, shifted with the pan offset.
fn draw_grid<S: Surface + ?Sized>(state: &CanvasState, surface: &mut S) {
	let step = state.config.grid_size;
	if step <= 0.0 {
		return;
	}
	let offset = state.viewport.offset();
	surface.set_fill_style(GRID_DOT_COLOR);
	let mut x = offset.x.rem_euclid(step);
	while x < state.width {
		let mut y = offset.y.rem_euclid(step);
		while y < state.height {
			surface.fill_rect(x, y, GRID_DOT, GRID_DOT);
			y += step;
		}
		x += step;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::diagram_canvas::geometry::Point;
	use crate::components::diagram_canvas::config::CanvasConfig;
	use crate::components::diagram_canvas::geometry::Bounds;
	use crate::components::diagram_canvas::node::Node;
	use crate::components::diagram_canvas::state::Button;
	use crate::components::diagram_canvas::surface::HeadlessSurface;
	use crate::components::diagram_canvas::visual_graph::VisualGraph;

	#[test]
	fn labels_follow_the_viewport() {
		let config = CanvasConfig::default();
		let mut graph = VisualGraph::new();
		graph.add_node(Node::new(
			"api".into(),
			Bounds::new(0.0, 0.0, 175.0, 50.0),
			"api",
			&config,
		));
		let mut state = CanvasState::new(graph, config, 400.0, 300.0);
		state.viewport.set(2.0, Point::new(10.0, 10.0));

		let mut surface = HeadlessSurface::default();
		render(&mut state, &mut surface);
		let label = surface.texts.iter().find(|t| t.text == "api").unwrap();
		// One line grows the node to 52 high; text sits at its center.
		assert_eq!(label.at, Point::new(10.0 + 87.5 * 2.0, 10.0 + 26.0 * 2.0));
	}

	#[test]
	fn ghost_is_drawn_while_connecting() {
		let config = CanvasConfig::default();
		let mut graph = VisualGraph::new();
		graph.add_node(Node::new(
			"a".into(),
			Bounds::new(0.0, 0.0, 100.0, 50.0),
			"",
			&config,
		));
		let mut state = CanvasState::new(graph, config, 400.0, 300.0);
		let mut surface = HeadlessSurface::default();

		render(&mut state, &mut surface);
		let idle_strokes = surface.strokes;

		let mut surface = HeadlessSurface::default();
		state.on_pointer_down(&mut surface, Point::new(100.0, 25.0), Button::Primary);
		render(&mut state, &mut surface);
		assert!(surface.strokes > idle_strokes);
	}

	#[test]
	fn grid_phase_follows_the_pan() {
		let mut state = CanvasState::new(VisualGraph::new(), CanvasConfig::default(), 100.0, 100.0);
		let mut surface = HeadlessSurface::default();
		render(&mut state, &mut surface);
		// Background plus a 2x2 lattice at 0 and 50.
		assert_eq!(surface.fills, 1 + 4);

		state.viewport.set(1.0, Point::new(-60.0, 0.0));
		render(&mut state, &mut surface);
		// Columns at 40 and 90.
		assert_eq!(surface.fills, 1 + 4);

		state.viewport.set(1.0, Point::new(-25.0, -25.0));
		render(&mut state, &mut surface);
		assert_eq!(surface.fills, 1 + 4);
	}
}
