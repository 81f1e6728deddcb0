use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GraphError;
use crate::layout::LayoutMode;

pub mod style;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Tooltip-only key/value data. Layout never reads it.
    #[serde(default, rename = "data", alias = "payload")]
    pub payload: BTreeMap<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind: None,
            payload: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Graph data as supplied by a producer, before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hint: Option<LayoutMode>,
}

impl GraphPayload {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            layout_hint: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingEndpoint {
    Source,
    Target,
    Both,
}

/// An edge removed during validation because an endpoint does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedEdge {
    /// Position of the edge in the payload's edge list.
    pub index: usize,
    pub source: String,
    pub target: String,
    pub missing: MissingEndpoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub kind: Option<String>,
}

/// Validated, immutable graph snapshot. Node and edge indices are stable for
/// the lifetime of the snapshot and key every per-node arena in the engine.
#[derive(Clone, Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming_count: Vec<usize>,
}

pub struct Validated {
    pub graph: Graph,
    pub dropped: Vec<DroppedEdge>,
}

impl Graph {
    pub fn validate(payload: GraphPayload) -> Result<Validated, GraphError> {
        let GraphPayload { nodes, edges, .. } = payload;

        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if let Some(&first) = index_by_id.get(&node.id) {
                return Err(GraphError::InvalidGraph {
                    id: node.id.clone(),
                    first,
                    duplicate: index,
                });
            }
            index_by_id.insert(node.id.clone(), index);
        }

        let mut kept = Vec::with_capacity(edges.len());
        let mut dropped = Vec::new();
        for (index, edge) in edges.into_iter().enumerate() {
            let source = index_by_id.get(&edge.source).copied();
            let target = index_by_id.get(&edge.target).copied();
            match (source, target) {
                (Some(source), Some(target)) => kept.push(GraphEdge {
                    source,
                    target,
                    kind: edge.kind,
                }),
                (source, target) => {
                    let missing = match (source, target) {
                        (None, None) => MissingEndpoint::Both,
                        (None, Some(_)) => MissingEndpoint::Source,
                        _ => MissingEndpoint::Target,
                    };
                    dropped.push(DroppedEdge {
                        index,
                        source: edge.source,
                        target: edge.target,
                        missing,
                    });
                }
            }
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming_count = vec![0usize; nodes.len()];
        for (edge_index, edge) in kept.iter().enumerate() {
            outgoing[edge.source].push(edge_index);
            incoming_count[edge.target] += 1;
        }

        Ok(Validated {
            graph: Self {
                nodes,
                edges: kept,
                index_by_id,
                outgoing,
                incoming_count,
            },
            dropped,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Edge indices leaving `node`, in payload order.
    pub fn outgoing(&self, node: usize) -> &[usize] {
        self.outgoing.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_incoming(&self, node: usize) -> bool {
        self.incoming_count.get(node).is_some_and(|&count| count > 0)
    }

    /// Number of edges touching each node; self-loops count once.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            degrees[edge.source] += 1;
            if edge.target != edge.source {
                degrees[edge.target] += 1;
            }
        }
        degrees
    }
}
