//! Infinite-canvas diagram editor: a browser-free engine (geometry, elements,
//! graph, viewport, gestures, autosave) behind a [`Surface`], plus the Leptos
//! component that feeds it DOM events.

mod autosave;
mod component;
mod config;
mod context_menu;
mod edge;
mod element;
mod error;
mod geometry;
mod node;
mod render;
mod state;
mod surface;
mod types;
mod viewport;
mod visual_graph;

pub use autosave::{AutosaveConfig, BrowserClock, Clock, ManualClock, SaveEvent, SaveScheduler};
pub use component::DiagramCanvas;
pub use config::CanvasConfig;
pub use context_menu::{CanvasCommand, ContextMenu, MenuAction};
pub use edge::Edge;
pub use element::{ContextActions, Draggable, Hit, Hoverable};
pub use error::ModelError;
pub use geometry::{Bounds, Connector, ConnectorSide, Curve, Point};
pub use node::{LABEL_FONT, Node, wrap_label};
pub use render::render;
pub use state::{Button, CanvasState, ConnectOutcome, Cursor, Effect, Gesture};
pub use surface::{DrawnText, HeadlessSurface, Surface};
pub use types::{EdgeId, Graph, GraphEdge, GraphNode, NodeId, Project, ServiceDefinition};
pub use viewport::{Viewport, ZoomDirection};
pub use visual_graph::VisualGraph;
