mod interaction;
mod search;

use std::mem;

use eframe::egui::{Pos2, Vec2};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, HierarchyConfig, PhysicsConfig};
use crate::error::{ConfigError, GraphError, ViewportError};
use crate::events::{EngineEvent, Warning};
use crate::graph::style::{EdgeStyle, NodeStyle, Theme};
use crate::graph::{DroppedEdge, Graph, GraphPayload, Validated};
use crate::layout::{EdgeRole, LayoutMode, TreePlan, radial};
use crate::physics::{ForceSimulation, SimulationStatus};
use crate::render::{RenderEdge, RenderFrame, RenderNode, Renderer};
use crate::util::{is_finite, truncate_label};
use crate::viewport::Viewport;

pub use interaction::{DragSession, PointerEvent, Tooltip};
use interaction::InteractionState;
pub use search::SearchHit;

const DEFAULT_SURFACE: Vec2 = Vec2::new(800.0, 600.0);

/// Summary of a successful load.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges: usize,
    pub dropped: Vec<DroppedEdge>,
    pub layout_hint: Option<LayoutMode>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineStats {
    pub nodes: usize,
    pub edges: usize,
    pub dropped_edges: usize,
    pub layout: LayoutMode,
    pub simulation: SimulationStatus,
    pub alpha: f32,
    pub tick: u64,
    pub scale: f32,
}

enum ActiveLayout {
    Force(ForceSimulation),
    Tree {
        plan: TreePlan,
        positions: Vec<Vec2>,
    },
}

/// Everything derived from one loaded graph. Per-node vectors share the
/// graph's node indices.
struct Scene {
    graph: Graph,
    node_styles: Vec<NodeStyle>,
    edge_styles: Vec<EdgeStyle>,
    labels: Vec<String>,
    dropped_edges: usize,
    layout: ActiveLayout,
}

impl Scene {
    fn position(&self, index: usize) -> Option<Vec2> {
        match &self.layout {
            ActiveLayout::Force(simulation) => simulation.position(index),
            ActiveLayout::Tree { positions, .. } => positions.get(index).copied(),
        }
    }

    fn edge_role(&self, edge: usize) -> EdgeRole {
        match &self.layout {
            ActiveLayout::Force(_) => EdgeRole::Link,
            ActiveLayout::Tree { plan, .. } => plan
                .edge_roles()
                .get(edge)
                .copied()
                .unwrap_or(EdgeRole::Cross),
        }
    }

    fn is_pinned(&self, index: usize) -> bool {
        match &self.layout {
            ActiveLayout::Force(simulation) => simulation.is_pinned(index),
            ActiveLayout::Tree { .. } => false,
        }
    }

    fn simulation(&self) -> Option<&ForceSimulation> {
        match &self.layout {
            ActiveLayout::Force(simulation) => Some(simulation),
            ActiveLayout::Tree { .. } => None,
        }
    }
}

/// Renderer-agnostic graph view: owns the loaded graph, its layout, the
/// viewport and the pointer state. The host drives it one frame at a time.
pub struct Engine {
    config: EngineConfig,
    theme: Theme,
    layout: LayoutMode,
    surface: Vec2,
    viewport: Viewport,
    scene: Option<Scene>,
    interaction: InteractionState,
    events: Vec<EngineEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let theme = Theme::from_config(&config.theme)?;
        Ok(Self {
            layout: config.layout,
            viewport: Viewport::new(config.viewport),
            theme,
            config,
            surface: DEFAULT_SURFACE,
            scene: None,
            interaction: InteractionState::default(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn surface_size(&self) -> Vec2 {
        self.surface
    }

    pub fn surface_center(&self) -> Pos2 {
        (self.surface * 0.5).to_pos2()
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.scene.as_ref().map(|scene| &scene.graph)
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Validates and installs a new graph. On error the current graph stays
    /// loaded and nothing else changes.
    pub fn load(&mut self, payload: GraphPayload) -> Result<LoadReport, GraphError> {
        let layout_hint = payload.layout_hint;
        let Validated { graph, dropped } = Graph::validate(payload).inspect_err(|error| {
            warn!(%error, "graph rejected");
        })?;

        self.cancel_gesture(false);
        self.interaction = InteractionState::default();

        for edge in &dropped {
            warn!(
                index = edge.index,
                source = %edge.source,
                target = %edge.target,
                missing = ?edge.missing,
                "dropping edge with a missing endpoint"
            );
            self.events.push(EngineEvent::Warning(Warning::DanglingEdge {
                index: edge.index,
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing: edge.missing,
            }));
        }

        let node_styles = graph
            .nodes()
            .iter()
            .map(|node| *self.theme.resolve_node(node.kind.as_deref()))
            .collect::<Vec<_>>();
        let edge_styles = graph
            .edges()
            .iter()
            .map(|edge| *self.theme.resolve_edge(edge.kind.as_deref()))
            .collect();
        let label_max_chars = self.config.interaction.label_max_chars;
        let labels = graph
            .nodes()
            .iter()
            .map(|node| truncate_label(node.display_label(), label_max_chars))
            .collect();

        let layout = self.build_layout(&graph, &node_styles);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dropped = dropped.len(),
            layout = %self.layout,
            "graph loaded"
        );

        let report = LoadReport {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            dropped,
            layout_hint,
        };
        self.scene = Some(Scene {
            graph,
            node_styles,
            edge_styles,
            labels,
            dropped_edges: report.dropped.len(),
            layout,
        });
        Ok(report)
    }

    fn build_layout(&mut self, graph: &Graph, node_styles: &[NodeStyle]) -> ActiveLayout {
        match self.layout {
            LayoutMode::Force => {
                let radii = node_styles.iter().map(NodeStyle::radius).collect();
                ActiveLayout::Force(ForceSimulation::new(
                    graph,
                    radii,
                    self.config.physics,
                    self.surface * 0.5,
                ))
            }
            mode => {
                let plan = TreePlan::build(graph);
                self.report_plan(graph, &plan);
                let positions = tree_positions(&plan, mode, &self.config.hierarchy, self.surface);
                ActiveLayout::Tree { plan, positions }
            }
        }
    }

    fn report_plan(&mut self, graph: &Graph, plan: &TreePlan) {
        let id = |index: usize| {
            graph
                .node(index)
                .map(|node| node.id.clone())
                .unwrap_or_default()
        };

        if plan.is_degenerate()
            && let Some(root) = plan.primary_root()
        {
            let fallback_root = id(root);
            warn!(root = %fallback_root, "every node has an incoming edge, rooting at the first node");
            self.events
                .push(EngineEvent::Warning(Warning::DegenerateHierarchy { fallback_root }));
        }

        for &root in plan.detached_roots() {
            let root = id(root);
            debug!(%root, "detached subtree");
            self.events
                .push(EngineEvent::Warning(Warning::DetachedSubtree { root }));
        }
    }

    /// Switches the active layout. Tree layouts are computed at once; the
    /// force layout restarts from the initial spiral.
    pub fn set_layout(&mut self, mode: LayoutMode) {
        if mode == self.layout {
            return;
        }

        self.cancel_gesture(false);
        self.layout = mode;
        if let Some(scene) = self.scene.take() {
            let layout = self.build_layout(&scene.graph, &scene.node_styles);
            self.scene = Some(Scene { layout, ..scene });
        }

        info!(%mode, "layout changed");
        self.events.push(EngineEvent::LayoutChanged { mode });
    }

    pub fn set_surface_size(&mut self, size: Vec2) {
        if !is_finite(size) || size.x <= 0.0 || size.y <= 0.0 || size == self.surface {
            return;
        }

        self.surface = size;
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        match &mut scene.layout {
            ActiveLayout::Force(simulation) => simulation.set_center(size * 0.5),
            ActiveLayout::Tree { plan, positions } => {
                *positions = tree_positions(plan, self.layout, &self.config.hierarchy, size);
            }
        }
    }

    /// Replaces the physics parameters and reheats the force layout.
    pub fn set_physics(&mut self, physics: PhysicsConfig) -> Result<(), ConfigError> {
        physics.validate()?;
        self.config.physics = physics;
        if let Some(simulation) = self.simulation_mut() {
            simulation.set_config(physics);
        }
        debug!("physics parameters updated");
        Ok(())
    }

    fn simulation_mut(&mut self) -> Option<&mut ForceSimulation> {
        match &mut self.scene.as_mut()?.layout {
            ActiveLayout::Force(simulation) => Some(simulation),
            ActiveLayout::Tree { .. } => None,
        }
    }

    /// Runs one simulation tick. Returns true when positions changed.
    pub fn advance(&mut self) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        let ActiveLayout::Force(simulation) = &mut scene.layout else {
            return false;
        };
        if !simulation.tick() {
            return false;
        }

        let tick = simulation.tick_count();
        self.events.push(EngineEvent::PositionsUpdated {
            tick,
            alpha: simulation.alpha(),
        });
        if !simulation.is_running() {
            self.events.push(EngineEvent::SimulationSettled { tick });
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.scene
            .as_ref()
            .and_then(Scene::simulation)
            .is_some_and(ForceSimulation::is_running)
    }

    /// Graph-space position of a node under the active layout.
    pub fn node_position(&self, index: usize) -> Option<Vec2> {
        self.scene.as_ref()?.position(index)
    }

    pub fn node_position_by_id(&self, id: &str) -> Option<Vec2> {
        let scene = self.scene.as_ref()?;
        scene.position(scene.graph.index_of(id)?)
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.scene.as_ref().is_some_and(|scene| {
            scene
                .graph
                .index_of(id)
                .is_some_and(|index| scene.is_pinned(index))
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn zoom_in(&mut self) -> Result<(), ViewportError> {
        let center = self.surface_center();
        self.viewport.zoom_in(center)
    }

    pub fn zoom_out(&mut self) -> Result<(), ViewportError> {
        let center = self.surface_center();
        self.viewport.zoom_out(center)
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn frame(&self) -> RenderFrame<'_> {
        let transform = self.viewport.transform();
        let Some(scene) = &self.scene else {
            return RenderFrame {
                transform,
                ..RenderFrame::default()
            };
        };

        let hovered = self.interaction.hovered;
        let highlighted = self.interaction.highlighted;

        let nodes = scene
            .graph
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let world = scene.position(index)?;
                Some(RenderNode {
                    id: node.id.as_str(),
                    label: scene.labels[index].as_str(),
                    world,
                    screen: transform.to_screen(world),
                    style: scene.node_styles[index],
                    hovered: hovered == Some(index),
                    highlighted: highlighted == Some(index),
                    pinned: scene.is_pinned(index),
                })
            })
            .collect();

        let edges = scene
            .graph
            .edges()
            .iter()
            .enumerate()
            .filter_map(|(index, edge)| {
                let from = scene.position(edge.source)?;
                let to = scene.position(edge.target)?;
                let role = scene.edge_role(index);
                let style = if role == EdgeRole::Cross {
                    self.theme.cross_edge
                } else {
                    scene.edge_styles[index]
                };
                Some(RenderEdge {
                    from: transform.to_screen(from),
                    to: transform.to_screen(to),
                    style,
                    role,
                    highlighted: highlighted
                        .is_some_and(|node| node == edge.source || node == edge.target),
                })
            })
            .collect();

        let tooltip = if self.config.interaction.tooltips {
            self.tooltip()
        } else {
            None
        };

        RenderFrame {
            transform,
            nodes,
            edges,
            tooltip,
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        let frame = self.frame();
        renderer.draw(&frame);
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    pub fn stats(&self) -> EngineStats {
        let scene = self.scene.as_ref();
        let simulation = scene.and_then(Scene::simulation);
        EngineStats {
            nodes: scene.map_or(0, |scene| scene.graph.node_count()),
            edges: scene.map_or(0, |scene| scene.graph.edge_count()),
            dropped_edges: scene.map_or(0, |scene| scene.dropped_edges),
            layout: self.layout,
            simulation: simulation.map_or(SimulationStatus::Idle, ForceSimulation::status),
            alpha: simulation.map_or(0.0, ForceSimulation::alpha),
            tick: simulation.map_or(0, ForceSimulation::tick_count),
            scale: self.viewport.scale(),
        }
    }

    /// Drops the scene and every pending event. The engine stays usable and
    /// comes back on the next successful `load`.
    pub fn teardown(&mut self) {
        self.cancel_gesture(false);
        if let Some(simulation) = self.simulation_mut() {
            simulation.stop();
        }
        self.scene = None;
        self.interaction = InteractionState::default();
        self.events.clear();
        info!("engine torn down");
    }
}

fn tree_positions(
    plan: &TreePlan,
    mode: LayoutMode,
    config: &HierarchyConfig,
    surface: Vec2,
) -> Vec<Vec2> {
    match mode {
        LayoutMode::Radial => radial::project(plan, surface * 0.5, config.level_spacing),
        LayoutMode::Force | LayoutMode::Hierarchy => plan.positions(config, surface.x * 0.5),
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{Edge, Node};

    fn payload(nodes: &[&str], edges: &[(&str, &str)]) -> GraphPayload {
        GraphPayload::new(
            nodes.iter().map(|id| Node::new(*id)).collect(),
            edges
                .iter()
                .map(|(source, target)| Edge::new(*source, *target))
                .collect(),
        )
    }

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).expect("default config is valid")
    }

    #[test]
    fn load_reports_dropped_edges_as_warnings() {
        let mut engine = engine();
        let report = engine
            .load(payload(&["a", "b"], &[("a", "b"), ("a", "zz"), ("yy", "b")]))
            .expect("load succeeds");

        assert_eq!(report.nodes, 2);
        assert_eq!(report.edges, 1);
        assert_eq!(report.dropped.len(), 2);
        let warnings = engine
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, EngineEvent::Warning(Warning::DanglingEdge { .. })))
            .count();
        assert_eq!(warnings, 2);
        assert_eq!(engine.stats().dropped_edges, 2);
    }

    #[test]
    fn failed_load_keeps_previous_scene() {
        let mut engine = engine();
        engine.load(payload(&["a", "b"], &[("a", "b")])).expect("first load");
        let error = engine
            .load(payload(&["x", "x"], &[]))
            .expect_err("duplicate ids");

        assert!(matches!(error, GraphError::InvalidGraph { .. }));
        assert_eq!(engine.stats().nodes, 2);
        assert!(engine.node_position_by_id("a").is_some());
    }

    #[test]
    fn tree_layout_styles_cross_edges() {
        let mut engine = Engine::new(EngineConfig {
            layout: LayoutMode::Hierarchy,
            ..EngineConfig::default()
        })
        .expect("config is valid");
        engine
            .load(payload(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]))
            .expect("load succeeds");

        let frame = engine.frame();
        let roles = frame.edges.iter().map(|edge| edge.role).collect::<Vec<_>>();
        assert_eq!(roles, vec![EdgeRole::Tree, EdgeRole::Tree, EdgeRole::Cross]);
        assert_eq!(frame.edges[2].style, engine.theme().cross_edge);
        assert!(!engine.is_animating());
        assert!(!engine.advance());
    }

    #[test]
    fn layout_switch_emits_event_and_rebuilds_positions() {
        let mut engine = engine();
        engine.load(payload(&["r", "a"], &[("r", "a")])).expect("load");
        engine.drain_events();

        engine.set_layout(LayoutMode::Hierarchy);
        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::LayoutChanged {
                mode: LayoutMode::Hierarchy
            }]
        );
        let config = HierarchyConfig::default();
        assert_eq!(
            engine.node_position_by_id("a").map(|position| position.y),
            Some(config.top_margin + config.level_spacing)
        );

        engine.set_layout(LayoutMode::Hierarchy);
        assert!(engine.drain_events().is_empty());

        engine.set_layout(LayoutMode::Force);
        assert!(engine.is_animating());
    }

    #[test]
    fn degenerate_hierarchy_is_reported() {
        let mut engine = engine();
        engine.set_layout(LayoutMode::Radial);
        engine
            .load(payload(&["a", "b"], &[("a", "b"), ("b", "a")]))
            .expect("load");

        assert!(engine.drain_events().contains(&EngineEvent::Warning(
            Warning::DegenerateHierarchy {
                fallback_root: "a".to_owned()
            }
        )));
    }

    #[test]
    fn surface_resize_recenters_tree_layouts() {
        let mut engine = engine();
        engine.set_layout(LayoutMode::Hierarchy);
        engine.load(payload(&["root"], &[])).expect("load");

        engine.set_surface_size(vec2(1000.0, 500.0));
        assert_eq!(engine.node_position(0).map(|position| position.x), Some(500.0));
        engine.set_surface_size(vec2(f32::NAN, 10.0));
        assert_eq!(engine.surface_size(), vec2(1000.0, 500.0));
    }

    #[test]
    fn advance_emits_updates_then_settles() {
        let mut engine = engine();
        engine.load(payload(&["a", "b"], &[("a", "b")])).expect("load");
        engine.drain_events();

        let mut ticks = 0;
        while engine.advance() {
            ticks += 1;
        }
        let events = engine.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, EngineEvent::PositionsUpdated { .. }))
                .count(),
            ticks
        );
        assert!(matches!(
            events.last(),
            Some(EngineEvent::SimulationSettled { .. })
        ));
        assert!(!engine.advance());
    }

    #[test]
    fn set_physics_validates_and_reheats() {
        let mut engine = engine();
        engine.load(payload(&["a", "b"], &[("a", "b")])).expect("load");
        while engine.advance() {}

        let invalid = PhysicsConfig {
            velocity_decay: 2.0,
            ..PhysicsConfig::default()
        };
        assert!(engine.set_physics(invalid).is_err());
        assert!(!engine.is_animating());

        let shorter = PhysicsConfig {
            link_distance: 40.0,
            ..PhysicsConfig::default()
        };
        engine.set_physics(shorter).expect("valid physics");
        assert!(engine.is_animating());
        assert_eq!(engine.stats().alpha, 1.0);
    }

    #[test]
    fn teardown_stops_everything_until_next_load() {
        let mut engine = engine();
        engine.load(payload(&["a", "b"], &[("a", "b")])).expect("load");
        engine.teardown();

        assert!(!engine.advance());
        assert!(!engine.is_animating());
        assert!(engine.drain_events().is_empty());
        assert!(engine.frame().is_empty());

        engine.load(payload(&["c"], &[])).expect("reload");
        assert!(engine.is_animating());
    }
}
