use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

use super::TreePlan;

/// Projects a tree plan onto concentric rings around `center`: a node's
/// angle follows its unit center across the forest and its ring follows its
/// depth. Forests are pushed out by one ring so separate roots do not share
/// the center point.
pub fn project(plan: &TreePlan, center: Vec2, level_spacing: f32) -> Vec<Vec2> {
    let total = plan.total_width().max(1) as f32;
    let ring_offset = if plan.roots().len() > 1 { 1.0 } else { 0.0 };

    (0..plan.node_count())
        .map(|node| {
            let angle = (plan.unit_center(node) / total) * TAU - FRAC_PI_2;
            let radius = (plan.depth(node) as f32 + ring_offset) * level_spacing;
            center + vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Graph, GraphPayload, Node};

    fn plan(nodes: &[&str], edges: &[(&str, &str)]) -> TreePlan {
        let graph = Graph::validate(GraphPayload::new(
            nodes.iter().map(|id| Node::new(*id)).collect(),
            edges
                .iter()
                .map(|(source, target)| Edge::new(*source, *target))
                .collect(),
        ))
        .expect("graph is valid")
        .graph;
        TreePlan::build(&graph)
    }

    #[test]
    fn single_tree_root_sits_at_center() {
        let plan = plan(&["r", "a", "b", "c"], &[("r", "a"), ("r", "b"), ("r", "c")]);
        let center = vec2(300.0, 200.0);
        let positions = project(&plan, center, 100.0);

        assert!((positions[0] - center).length() < 1e-4);
        for child in &positions[1..] {
            assert!(((*child - center).length() - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn forest_roots_move_to_the_first_ring() {
        let plan = plan(&["a", "b"], &[]);
        let positions = project(&plan, Vec2::ZERO, 50.0);

        assert_eq!(plan.roots().len(), 2);
        for position in positions {
            assert!((position.length() - 50.0).abs() < 1e-3);
        }
    }
}
