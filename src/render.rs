use eframe::egui::{Pos2, Vec2};

use crate::engine::Tooltip;
use crate::graph::style::{EdgeStyle, NodeStyle};
use crate::layout::EdgeRole;
use crate::viewport::Transform;

/// Drawing backend fed one snapshot per frame. Positions are already in
/// surface coordinates; sizes are in graph units and scale with
/// `frame.transform.scale`.
pub trait Renderer {
    fn draw(&mut self, frame: &RenderFrame<'_>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode<'a> {
    pub id: &'a str,
    /// Display label, already truncated.
    pub label: &'a str,
    pub world: Vec2,
    pub screen: Pos2,
    pub style: NodeStyle,
    pub hovered: bool,
    pub highlighted: bool,
    pub pinned: bool,
}

impl RenderNode<'_> {
    pub fn screen_radius(&self, transform: Transform) -> f32 {
        self.style.radius() * transform.scale
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
    pub from: Pos2,
    pub to: Pos2,
    pub style: EdgeStyle,
    pub role: EdgeRole,
    /// True when either endpoint is the highlighted node.
    pub highlighted: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderFrame<'a> {
    pub transform: Transform,
    pub nodes: Vec<RenderNode<'a>>,
    pub edges: Vec<RenderEdge>,
    pub tooltip: Option<Tooltip<'a>>,
}

impl RenderFrame<'_> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
