use eframe::egui::{Vec2, vec2};

use crate::config::HierarchyConfig;
use crate::graph::Graph;

use super::EdgeRole;

/// Rooted forest built from a graph's edge list. Every node is placed
/// exactly once; an edge reaching an already placed node becomes a cross
/// edge instead of a second parent.
#[derive(Clone, Debug, PartialEq)]
pub struct TreePlan {
    roots: Vec<usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depth: Vec<usize>,
    /// Leaf-count width of each node's subtree, at least one.
    width: Vec<usize>,
    /// Offset (in width units) of each node's center from the forest's left edge.
    center: Vec<f32>,
    edge_roles: Vec<EdgeRole>,
    /// True when no node lacked an incoming edge and the first node was used.
    degenerate: bool,
}

impl TreePlan {
    pub fn build(graph: &Graph) -> Self {
        let node_count = graph.node_count();
        let mut plan = Self {
            roots: Vec::new(),
            parent: vec![None; node_count],
            children: vec![Vec::new(); node_count],
            depth: vec![0; node_count],
            width: vec![1; node_count],
            center: vec![0.0; node_count],
            edge_roles: vec![EdgeRole::Cross; graph.edge_count()],
            degenerate: false,
        };
        if node_count == 0 {
            return plan;
        }

        let candidates = (0..node_count)
            .filter(|&index| !graph.has_incoming(index))
            .collect::<Vec<_>>();
        plan.degenerate = candidates.is_empty();

        let mut placed = vec![false; node_count];
        let mut preorder = Vec::with_capacity(node_count);
        let root_order = candidates.into_iter().chain(0..node_count);
        for root in root_order {
            if placed[root] {
                continue;
            }
            plan.roots.push(root);
            plan.walk(graph, root, &mut placed, &mut preorder);
        }

        for &node in preorder.iter().rev() {
            let children_width = plan.children[node]
                .iter()
                .map(|&child| plan.width[child])
                .sum::<usize>();
            plan.width[node] = children_width.max(1);
        }

        let mut offset = 0usize;
        for root_index in 0..plan.roots.len() {
            let root = plan.roots[root_index];
            plan.assign_spans(root, offset);
            offset += plan.width[root];
        }

        plan
    }

    /// Depth-first walk over outgoing edges in payload order. The first edge
    /// to reach a node becomes its tree edge.
    fn walk(&mut self, graph: &Graph, root: usize, placed: &mut [bool], preorder: &mut Vec<usize>) {
        placed[root] = true;
        preorder.push(root);
        let mut stack = vec![(root, 0usize)];

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let outgoing = graph.outgoing(node);
            let Some(&edge_index) = outgoing.get(cursor) else {
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let target = graph.edges()[edge_index].target;
            if placed[target] {
                self.edge_roles[edge_index] = EdgeRole::Cross;
                continue;
            }

            placed[target] = true;
            preorder.push(target);
            self.edge_roles[edge_index] = EdgeRole::Tree;
            self.parent[target] = Some(node);
            self.depth[target] = self.depth[node] + 1;
            self.children[node].push(target);
            stack.push((target, 0));
        }
    }

    fn assign_spans(&mut self, root: usize, start: usize) {
        let mut pending = vec![(root, start)];
        while let Some((node, start)) = pending.pop() {
            self.center[node] = start as f32 + self.width[node] as f32 * 0.5;
            let mut child_start = start;
            for &child in &self.children[node] {
                pending.push((child, child_start));
                child_start += self.width[child];
            }
        }
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// The root chosen for the first tree, if the graph has any node.
    pub fn primary_root(&self) -> Option<usize> {
        self.roots.first().copied()
    }

    /// Roots of trees after the first one; nodes the primary root cannot reach.
    pub fn detached_roots(&self) -> &[usize] {
        self.roots.get(1..).unwrap_or(&[])
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parent.get(node).copied().flatten()
    }

    pub fn children(&self, node: usize) -> &[usize] {
        self.children.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn depth(&self, node: usize) -> usize {
        self.depth.get(node).copied().unwrap_or(0)
    }

    pub fn max_depth(&self) -> usize {
        self.depth.iter().copied().max().unwrap_or(0)
    }

    pub fn subtree_width(&self, node: usize) -> usize {
        self.width.get(node).copied().unwrap_or(0)
    }

    pub fn unit_center(&self, node: usize) -> f32 {
        self.center.get(node).copied().unwrap_or(0.0)
    }

    pub fn total_width(&self) -> usize {
        self.roots.iter().map(|&root| self.width[root]).sum()
    }

    pub fn edge_roles(&self) -> &[EdgeRole] {
        &self.edge_roles
    }

    pub fn cross_edges(&self) -> impl Iterator<Item = usize> + '_ {
        self.edge_roles
            .iter()
            .enumerate()
            .filter(|(_, role)| **role == EdgeRole::Cross)
            .map(|(index, _)| index)
    }

    pub fn node_count(&self) -> usize {
        self.parent.len()
    }

    /// Top-down layered coordinates: depth maps to y, the forest is centered
    /// horizontally on `center_x`.
    pub fn positions(&self, config: &HierarchyConfig, center_x: f32) -> Vec<Vec2> {
        let half_width = self.total_width() as f32 * 0.5;
        (0..self.node_count())
            .map(|node| {
                vec2(
                    center_x + (self.center[node] - half_width) * config.sibling_spacing,
                    config.top_margin + self.depth[node] as f32 * config.level_spacing,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
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

    #[test]
    fn first_parent_wins_and_later_edges_are_cross_edges() {
        let graph = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let plan = TreePlan::build(&graph);

        assert_eq!(plan.primary_root(), Some(0));
        assert_eq!(plan.parent(1), Some(0));
        assert_eq!(plan.parent(2), Some(1));
        assert_eq!(
            plan.edge_roles(),
            &[EdgeRole::Tree, EdgeRole::Tree, EdgeRole::Cross]
        );
        assert_eq!(plan.cross_edges().collect::<Vec<_>>(), vec![2]);
        assert_eq!(plan.node_count(), 3);
        assert!(plan.detached_roots().is_empty());
    }

    #[test]
    fn root_is_first_node_without_incoming_edge() {
        let graph = graph(&["child", "root"], &[("root", "child")]);
        let plan = TreePlan::build(&graph);
        assert_eq!(plan.primary_root(), Some(1));
        assert!(!plan.is_degenerate());
    }

    #[test]
    fn cycles_fall_back_to_the_first_node() {
        let graph = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let plan = TreePlan::build(&graph);

        assert!(plan.is_degenerate());
        assert_eq!(plan.primary_root(), Some(0));
        assert_eq!(plan.depth(2), 2);
        assert_eq!(plan.edge_roles()[2], EdgeRole::Cross);
    }

    #[test]
    fn unreachable_nodes_start_their_own_trees() {
        let graph = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("c", "d"), ("d", "e"), ("e", "d")],
        );
        let plan = TreePlan::build(&graph);

        assert_eq!(plan.roots(), &[0, 2]);
        assert_eq!(plan.detached_roots(), &[2]);
        assert_eq!(plan.parent(4), Some(3));
    }

    #[test]
    fn subtree_width_is_the_sum_of_child_widths() {
        let graph = graph(
            &["r", "a", "b", "a1", "a2", "a3"],
            &[("r", "a"), ("r", "b"), ("a", "a1"), ("a", "a2"), ("a", "a3")],
        );
        let plan = TreePlan::build(&graph);

        assert_eq!(plan.subtree_width(0), 4);
        assert_eq!(plan.subtree_width(1), 3);
        assert_eq!(plan.subtree_width(2), 1);
        assert_eq!(plan.unit_center(0), 2.0);
        assert_eq!(plan.unit_center(1), 1.5);
        assert_eq!(plan.unit_center(2), 3.5);
        assert_eq!(plan.unit_center(3), 0.5);
    }

    #[test]
    fn positions_layer_by_depth_and_center_parents() {
        let graph = graph(&["r", "a", "b"], &[("r", "a"), ("r", "b")]);
        let plan = TreePlan::build(&graph);
        let config = HierarchyConfig::default();
        let positions = plan.positions(&config, 400.0);

        assert_eq!(positions[0], vec2(400.0, config.top_margin));
        assert_eq!(positions[1].y, config.top_margin + config.level_spacing);
        assert_eq!(positions[1].x, 400.0 - config.sibling_spacing * 0.5);
        assert_eq!(positions[2].x, 400.0 + config.sibling_spacing * 0.5);
    }

    #[test]
    fn self_loops_are_cross_edges() {
        let graph = graph(&["a"], &[("a", "a")]);
        let plan = TreePlan::build(&graph);
        assert!(plan.is_degenerate());
        assert_eq!(plan.edge_roles(), &[EdgeRole::Cross]);
    }

    #[test]
    fn empty_graph_has_no_root() {
        let plan = TreePlan::build(&graph(&[], &[]));
        assert_eq!(plan.primary_root(), None);
        assert!(plan.positions(&HierarchyConfig::default(), 0.0).is_empty());
    }

    #[test]
    fn building_twice_is_identical() {
        let graph = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("c", "d"), ("b", "d"), ("d", "a")],
        );
        let config = HierarchyConfig::default();
        let first = TreePlan::build(&graph);
        let second = TreePlan::build(&graph);
        assert_eq!(first, second);
        assert_eq!(first.positions(&config, 0.0), second.positions(&config, 0.0));
    }
}
