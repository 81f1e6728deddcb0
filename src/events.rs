use std::fmt;

use crate::graph::MissingEndpoint;
use crate::layout::LayoutMode;

/// Recoverable conditions reported alongside a successful load or layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    DanglingEdge {
        index: usize,
        source: String,
        target: String,
        missing: MissingEndpoint,
    },
    /// Every node has an incoming edge; the first node was used as root.
    DegenerateHierarchy { fallback_root: String },
    /// A tree the primary root cannot reach, laid out beside it.
    DetachedSubtree { root: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdge {
                index,
                source,
                target,
                missing,
            } => {
                let which = match missing {
                    MissingEndpoint::Source => "source",
                    MissingEndpoint::Target => "target",
                    MissingEndpoint::Both => "source and target",
                };
                write!(f, "edge #{index} {source} -> {target} dropped: missing {which}")
            }
            Self::DegenerateHierarchy { fallback_root } => {
                write!(f, "no node without incoming edges; rooted at {fallback_root}")
            }
            Self::DetachedSubtree { root } => {
                write!(f, "{root} is unreachable from the root and starts its own tree")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    PositionsUpdated { tick: u64, alpha: f32 },
    SimulationSettled { tick: u64 },
    NodeClicked { id: String },
    NodeHovered { id: String },
    NodeUnhovered { id: String },
    HighlightChanged { id: Option<String> },
    LayoutChanged { mode: LayoutMode },
    Warning(Warning),
}
