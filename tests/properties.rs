use proptest::prelude::*;
use service_canvas::components::diagram_canvas::{
	Bounds, Button, CanvasConfig, CanvasState, ConnectOutcome, ConnectorSide, Graph, GraphEdge,
	GraphNode, HeadlessSurface, Node, NodeId, Point, ServiceDefinition, Viewport, VisualGraph,
	ZoomDirection,
};

fn close(a: Point, b: Point) -> bool {
	let tolerance = 1e-6 * (1.0 + a.x.abs().max(a.y.abs()));
	(a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance
}

fn viewport(scale: f64, ox: f64, oy: f64) -> Viewport {
	let mut view = Viewport::new(&CanvasConfig::default());
	view.set(scale, Point::new(ox, oy));
	view
}

fn stored_graph() -> impl Strategy<Value = Graph> {
	(1usize..8).prop_flat_map(|n| {
		let nodes = prop::collection::vec((-500i32..500, -500i32..500, 50i32..300), n);
		let edges = prop::collection::vec((0..n, 0..n), 0..12);
		(nodes, edges).prop_map(|(nodes, edges)| {
			let nodes = nodes
				.into_iter()
				.enumerate()
				.map(|(i, (x, y, w))| GraphNode {
					id: NodeId(format!("n{i}")),
					x: x as f64,
					y: y as f64,
					width: w as f64,
					height: 50.0,
					label: format!("service {i}"),
					color: "#444".into(),
					service_definition: ServiceDefinition::default(),
				})
				.collect();
			let edges = edges
				.into_iter()
				.filter(|(from, to)| from != to)
				.map(|(from, to)| GraphEdge {
					from: NodeId(format!("n{from}")),
					to: NodeId(format!("n{to}")),
				})
				.collect();
			Graph::new(nodes, edges)
		})
	})
}

fn direction() -> impl Strategy<Value = ZoomDirection> {
	prop_oneof![Just(ZoomDirection::In), Just(ZoomDirection::Out)]
}

proptest! {
	#[test]
	fn screen_world_round_trip(
		scale in 0.5f64..5.0,
		ox in -2000.0f64..2000.0,
		oy in -2000.0f64..2000.0,
		x in -5000.0f64..5000.0,
		y in -5000.0f64..5000.0,
	) {
		let view = viewport(scale, ox, oy);
		let p = Point::new(x, y);
		prop_assert!(close(view.world_to_screen(view.screen_to_world(p)), p));
	}

	#[test]
	fn zoom_keeps_the_world_point_under_the_pointer(
		scale in 0.5f64..5.0,
		ox in -2000.0f64..2000.0,
		oy in -2000.0f64..2000.0,
		px in 0.0f64..1920.0,
		py in 0.0f64..1080.0,
		dir in direction(),
	) {
		let mut view = viewport(scale, ox, oy);
		let pointer = Point::new(px, py);
		let before = view.screen_to_world(pointer);
		view.zoom_at(pointer, dir);
		prop_assert!(close(view.screen_to_world(pointer), before));
	}

	#[test]
	fn zoom_never_leaves_the_bounds(steps in prop::collection::vec(direction(), 0..80)) {
		let mut view = Viewport::new(&CanvasConfig::default());
		for dir in steps {
			view.zoom_at(Point::new(400.0, 300.0), dir);
			prop_assert!((0.5..=5.0).contains(&view.scale()));
		}
	}

	#[test]
	fn dragged_node_moves_by_the_pointer_delta_over_scale(
		scale in 0.5f64..5.0,
		ox in -500.0f64..500.0,
		oy in -500.0f64..500.0,
		grab_x in 20.0f64..150.0,
		grab_y in 5.0f64..45.0,
		dx in -300.0f64..300.0,
		dy in -300.0f64..300.0,
	) {
		let config = CanvasConfig::default();
		let mut graph = VisualGraph::new();
		graph.add_node(Node::new("n".into(), Bounds::new(0.0, 0.0, 175.0, 50.0), "", &config));
		let mut state = CanvasState::new(graph, config, 1920.0, 1080.0);
		state.viewport.set(scale, Point::new(ox, oy));
		let mut surface = HeadlessSurface::default();

		let press = state.viewport.world_to_screen(Point::new(grab_x, grab_y));
		state.on_pointer_down(&mut surface, press, Button::Primary);
		state.on_pointer_move(&mut surface, Point::new(press.x + dx, press.y + dy));
		state.on_pointer_up();

		let moved = state.graph.node(&"n".into()).unwrap().position();
		prop_assert!(close(moved, Point::new(dx / scale, dy / scale)));
	}

	#[test]
	fn projection_round_trips_clean_graphs(graph in stored_graph()) {
		let visual = VisualGraph::from_graph(&graph, &CanvasConfig::default()).unwrap();
		prop_assert_eq!(Graph::from_visual_graph(&visual), graph.clone());
		prop_assert_eq!(Graph::from_json(&graph.to_json().unwrap()).unwrap(), graph);
	}

	#[test]
	fn connecting_twice_never_duplicates(pairs in prop::collection::vec((0usize..4, 0usize..4), 1..20)) {
		let config = CanvasConfig::default();
		let mut graph = VisualGraph::new();
		for i in 0..4 {
			let bounds = Bounds::new(i as f64 * 300.0, 0.0, 175.0, 50.0);
			graph.add_node(Node::new(NodeId(format!("n{i}")), bounds, "", &config));
		}
		let mut state = CanvasState::new(graph, config, 1920.0, 1080.0);

		for (a, b) in pairs {
			let (a, b) = (NodeId(format!("n{a}")), NodeId(format!("n{b}")));
			let existed = state.graph.has_edge(&a, &b);
			match state.connect(&a, ConnectorSide::Out, &b) {
				ConnectOutcome::SelfConnection => {
					prop_assert_eq!(&a, &b);
				}
				ConnectOutcome::Duplicate => {
					prop_assert!(existed);
				}
				ConnectOutcome::Created(_) => {
					prop_assert!(!existed);
				}
				ConnectOutcome::MissingNode => {
					prop_assert!(false, "all four nodes exist");
				}
			}
		}

		let edges = state.graph.edges();
		for (i, edge) in edges.iter().enumerate() {
			prop_assert!(edge.from != edge.to);
			prop_assert!(edges[i + 1..].iter().all(|other| other.id != edge.id));
		}
	}

	#[test]
	fn removing_a_node_leaves_no_dangling_edges(graph in stored_graph(), victim in 0usize..8) {
		let mut visual = VisualGraph::from_graph(&graph, &CanvasConfig::default()).unwrap();
		let id = NodeId(format!("n{victim}"));
		visual.remove_node(&id);

		let survivors: Vec<GraphEdge> = graph
			.edges
			.iter()
			.filter(|edge| edge.from != id && edge.to != id)
			.cloned()
			.collect();
		prop_assert_eq!(visual.to_graph().edges, survivors);
		for edge in visual.edges() {
			prop_assert!(visual.node(&edge.from).is_some());
			prop_assert!(visual.node(&edge.to).is_some());
		}
	}
}
