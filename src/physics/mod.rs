mod forces;
mod quadtree;

use eframe::egui::Vec2;
use tracing::{debug, trace};

use crate::config::PhysicsConfig;
use crate::graph::Graph;
use crate::util::{is_finite, phyllotaxis};
use forces::{
    Collision, Link, Repulsion, accumulate_centering, accumulate_collisions, accumulate_links,
    accumulate_repulsion_pairs, accumulate_repulsion_tree,
};
use quadtree::QuadNode;

/// Above this node count repulsion switches from exact pairs to Barnes-Hut.
pub const EXACT_PAIR_LIMIT: usize = 256;
const BARNES_HUT_THETA: f32 = 0.72;

/// Alpha kept while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Fixed coordinates while the interaction layer holds the node.
    pub pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    pinned: Vec<bool>,
}

/// Velocity-Verlet style force simulation over one graph snapshot. Bodies
/// are indexed like the graph's nodes.
pub struct ForceSimulation {
    bodies: Vec<Body>,
    radii: Vec<f32>,
    links: Vec<Link>,
    config: PhysicsConfig,
    center: Vec2,
    alpha: f32,
    alpha_target: f32,
    status: SimulationStatus,
    tick_count: u64,
    scratch: Scratch,
}

impl ForceSimulation {
    /// Places bodies on a spiral around `center` and starts hot. `radii`
    /// holds each node's collision radius.
    pub fn new(graph: &Graph, radii: Vec<f32>, config: PhysicsConfig, center: Vec2) -> Self {
        let node_count = graph.node_count();
        let bodies = (0..node_count)
            .map(|index| Body {
                position: center + phyllotaxis(index),
                velocity: Vec2::ZERO,
                pin: None,
            })
            .collect();

        let degrees = graph.degrees();
        let links = graph
            .edges()
            .iter()
            .filter(|edge| edge.source != edge.target)
            .map(|edge| Link::from_degrees(edge.source, edge.target, &degrees))
            .collect();

        let mut radii = radii;
        radii.resize(node_count, 0.0);

        let status = if node_count == 0 {
            SimulationStatus::Idle
        } else {
            SimulationStatus::Running
        };
        debug!(nodes = node_count, ?status, "force simulation created");

        Self {
            bodies,
            radii,
            links,
            config,
            center,
            alpha: 1.0,
            alpha_target: 0.0,
            status,
            tick_count: 0,
            scratch: Scratch::default(),
        }
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SimulationStatus::Running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).map(|body| body.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.bodies.iter().map(|body| body.position)
    }

    /// Raises alpha to at least `alpha` and resumes ticking.
    pub fn reheat(&mut self, alpha: f32) {
        if self.bodies.is_empty() {
            return;
        }
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        if self.status == SimulationStatus::Idle {
            debug!(alpha = self.alpha, "simulation reheated");
        }
        self.status = SimulationStatus::Running;
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    /// Applies new parameters and restarts from full heat.
    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
        self.alpha = 1.0;
        self.reheat(1.0);
    }

    /// Moves the centering target. Bodies follow on the next ticks.
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn stop(&mut self) {
        if self.status == SimulationStatus::Running {
            debug!(tick = self.tick_count, "simulation stopped");
        }
        self.status = SimulationStatus::Idle;
        self.alpha_target = 0.0;
    }

    pub(crate) fn pin(&mut self, index: usize, at: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = Some(at);
            body.position = at;
            body.velocity = Vec2::ZERO;
        }
    }

    pub(crate) fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = None;
        }
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.bodies.get(index).is_some_and(|body| body.pin.is_some())
    }

    /// Advances one step. Returns false when idle and nothing moved.
    pub fn tick(&mut self) -> bool {
        if self.status == SimulationStatus::Idle {
            return false;
        }

        let node_count = self.bodies.len();
        let alpha = self.alpha;
        let config = self.config;

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.pinned.clear();
        for body in &self.bodies {
            scratch.positions.push(body.position);
            scratch.pinned.push(body.pin.is_some());
        }
        scratch.forces.clear();
        scratch.forces.resize(node_count, Vec2::ZERO);

        let positions = &scratch.positions;
        let forces = &mut scratch.forces;

        accumulate_links(&self.links, positions, config.link_distance, alpha, forces);

        let repulsion = Repulsion {
            strength: config.charge_strength,
            distance_min_sq: config.distance_min * config.distance_min,
            theta: BARNES_HUT_THETA,
        };
        let quadtree = if node_count > 1 {
            QuadNode::build(positions)
        } else {
            None
        };
        match &quadtree {
            Some(tree) if node_count > EXACT_PAIR_LIMIT => {
                for (index, force) in forces.iter_mut().enumerate() {
                    accumulate_repulsion_tree(tree, index, positions, repulsion, alpha, force);
                }
            }
            _ => accumulate_repulsion_pairs(positions, repulsion, alpha, forces),
        }

        let max_radius = self.radii.iter().copied().fold(0.0_f32, f32::max);
        let reach = max_radius * 2.0 + config.collision_padding;
        if let Some(tree) = &quadtree
            && reach > 0.0
            && config.collision_strength != 0.0
        {
            let collision = Collision {
                strength: config.collision_strength * alpha,
                padding: config.collision_padding,
                reach_sq: reach * reach,
            };
            accumulate_collisions(tree, tree, true, positions, &self.radii, collision, forces);
        }

        accumulate_centering(
            positions,
            &scratch.pinned,
            self.center,
            config.center_strength,
            alpha,
            forces,
        );

        let retain = 1.0 - config.velocity_decay;
        for ((body, force), previous) in self.bodies.iter_mut().zip(forces.iter()).zip(positions) {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            let mut force = *force;
            let magnitude = force.length();
            if magnitude > config.max_force {
                force *= config.max_force / magnitude;
            }
            if !is_finite(force) {
                force = Vec2::ZERO;
            }

            body.velocity = (body.velocity + force) * retain;
            body.position += body.velocity;
            if !is_finite(body.position) {
                body.position = *previous;
                body.velocity = Vec2::ZERO;
            }
        }

        self.alpha += (self.alpha_target - self.alpha) * config.alpha_decay;
        self.tick_count += 1;
        trace!(tick = self.tick_count, alpha = self.alpha, "simulation tick");

        if self.alpha < config.alpha_min {
            self.status = SimulationStatus::Idle;
            debug!(tick = self.tick_count, alpha = self.alpha, "simulation settled");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::graph::{Edge, GraphPayload, Node};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        Graph::validate(GraphPayload::new(
            nodes.iter().map(|id| Node::new(*id)).collect(),
            edges
                .iter()
                .map(|(source, target)| Edge::new(*source, *target))
                .collect(),
        ))
        .expect("graph is valid")
        .graph
    }

    fn simulation(graph: &Graph) -> ForceSimulation {
        ForceSimulation::new(
            graph,
            vec![10.0; graph.node_count()],
            PhysicsConfig::default(),
            vec2(400.0, 300.0),
        )
    }

    fn run_to_rest(simulation: &mut ForceSimulation) -> usize {
        let mut ticks = 0;
        while simulation.tick() {
            ticks += 1;
            assert!(ticks < 10_000, "simulation never settled");
        }
        ticks
    }

    #[test]
    fn empty_graph_starts_idle() {
        let mut simulation = simulation(&graph(&[], &[]));
        assert_eq!(simulation.status(), SimulationStatus::Idle);
        assert!(!simulation.tick());
        simulation.reheat(1.0);
        assert_eq!(simulation.status(), SimulationStatus::Idle);
    }

    #[test]
    fn alpha_decreases_until_idle() {
        let mut simulation = simulation(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        let mut previous = simulation.alpha();
        while simulation.tick() {
            assert!(simulation.alpha() < previous);
            previous = simulation.alpha();
        }
        assert_eq!(simulation.status(), SimulationStatus::Idle);
        assert!(simulation.alpha() < PhysicsConfig::default().alpha_min);
        assert!((295..=305).contains(&simulation.tick_count()));

        let before = simulation.positions().collect::<Vec<_>>();
        assert!(!simulation.tick());
        assert_eq!(simulation.positions().collect::<Vec<_>>(), before);
    }

    #[test]
    fn reheat_resumes_ticking() {
        let mut simulation = simulation(&graph(&["a", "b"], &[("a", "b")]));
        run_to_rest(&mut simulation);
        simulation.reheat(DRAG_ALPHA_TARGET);
        assert_eq!(simulation.status(), SimulationStatus::Running);
        assert_eq!(simulation.alpha(), DRAG_ALPHA_TARGET);
        assert!(simulation.tick());
    }

    #[test]
    fn pinned_body_does_not_move() {
        let mut simulation = simulation(&graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]));
        let pin = vec2(-50.0, 75.0);
        simulation.pin(0, pin);
        for _ in 0..50 {
            simulation.tick();
            assert_eq!(simulation.position(0), Some(pin));
        }
        assert!(simulation.is_pinned(0));

        simulation.unpin(0);
        assert!(!simulation.is_pinned(0));
    }

    #[test]
    fn linked_pair_settles_near_link_distance() {
        let mut simulation = simulation(&graph(&["a", "b"], &[("a", "b")]));
        run_to_rest(&mut simulation);

        let a = simulation.position(0).expect("body a");
        let b = simulation.position(1).expect("body b");
        let distance = (a - b).length();
        assert!((90.0..130.0).contains(&distance), "distance {distance}");
        assert!(((a + b) * 0.5 - vec2(400.0, 300.0)).length() < 5.0);
    }

    #[test]
    fn large_graph_stays_finite() {
        let ids = (0..300).map(|index| format!("n{index}")).collect::<Vec<_>>();
        let nodes = ids.iter().map(|id| Node::new(id.as_str())).collect();
        let edges = (1..300)
            .map(|index| Edge::new(ids[index / 3].as_str(), ids[index].as_str()))
            .collect();
        let graph = Graph::validate(GraphPayload::new(nodes, edges))
            .expect("graph is valid")
            .graph;

        let mut simulation = simulation(&graph);
        for _ in 0..40 {
            simulation.tick();
        }
        assert!(simulation.positions().all(is_finite));
    }

    #[test]
    fn drag_target_keeps_the_simulation_warm() {
        let mut simulation = simulation(&graph(&["a", "b"], &[("a", "b")]));
        simulation.set_alpha_target(DRAG_ALPHA_TARGET);
        for _ in 0..1_000 {
            assert!(simulation.tick());
        }
        assert!(simulation.alpha() >= DRAG_ALPHA_TARGET);
        simulation.set_alpha_target(0.0);
        run_to_rest(&mut simulation);
        assert_eq!(simulation.status(), SimulationStatus::Idle);
    }
}
