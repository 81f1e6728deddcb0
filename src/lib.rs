//! Interactive graph layout engine: force-directed and hierarchical layouts,
//! a pan/zoom viewport and pointer interaction behind a renderer-agnostic
//! frame snapshot.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod layout;
pub mod physics;
pub mod render;
pub mod util;
pub mod viewport;

pub use config::EngineConfig;
pub use engine::{
    DragSession, Engine, EngineStats, LoadReport, PointerEvent, SearchHit, Tooltip,
};
pub use error::{ConfigError, GraphError, ViewportError};
pub use events::{EngineEvent, Warning};
pub use graph::{Edge, Graph, GraphPayload, Node};
pub use layout::LayoutMode;
pub use render::{RenderFrame, Renderer};
