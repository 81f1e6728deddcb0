use eframe::egui::Vec2;

use crate::util::jiggle;

use super::quadtree::QuadNode;

const COINCIDENT_EPSILON: f32 = 1e-4;

/// Spring between two bodies, with strength and endpoint bias derived from
/// node degrees so hubs move less than leaves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    /// Share of the correction applied to the target.
    pub(super) bias: f32,
}

impl Link {
    pub(super) fn from_degrees(source: usize, target: usize, degrees: &[usize]) -> Self {
        let source_degree = degrees[source].max(1) as f32;
        let target_degree = degrees[target].max(1) as f32;
        Self {
            source,
            target,
            strength: 1.0 / source_degree.min(target_degree),
            bias: source_degree / (source_degree + target_degree),
        }
    }
}

#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct Collision {
    /// Already scaled by the current alpha.
    pub(super) strength: f32,
    pub(super) padding: f32,
    /// Largest possible contact distance, used to prune cell pairs.
    pub(super) reach_sq: f32,
}

/// Unit vector from `to` towards `from` and their distance, with a stable
/// fallback direction when the points coincide.
fn separation(positions: &[Vec2], from: usize, to: usize) -> (Vec2, f32) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    if distance > COINCIDENT_EPSILON {
        (delta / distance, distance)
    } else {
        (jiggle(from, to), 0.0)
    }
}

pub(super) fn accumulate_links(
    links: &[Link],
    positions: &[Vec2],
    rest_length: f32,
    alpha: f32,
    forces: &mut [Vec2],
) {
    for link in links {
        if link.source == link.target {
            continue;
        }

        let (direction, distance) = separation(positions, link.target, link.source);
        let stretch = (distance - rest_length) * link.strength * alpha;
        let correction = direction * stretch;
        forces[link.target] -= correction * link.bias;
        forces[link.source] += correction * (1.0 - link.bias);
    }
}

fn repulsion_magnitude(distance: f32, params: Repulsion, alpha: f32) -> f32 {
    params.strength * alpha / (distance * distance).max(params.distance_min_sq)
}

/// Exact all-pairs repulsion.
pub(super) fn accumulate_repulsion_pairs(
    positions: &[Vec2],
    params: Repulsion,
    alpha: f32,
    forces: &mut [Vec2],
) {
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            let (direction, distance) = separation(positions, from, to);
            let push = direction * repulsion_magnitude(distance, params, alpha);
            forces[from] += push;
            forces[to] -= push;
        }
    }
}

/// Barnes-Hut repulsion on one body: distant cells act as a single mass at
/// their centroid.
pub(super) fn accumulate_repulsion_tree(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: Repulsion,
    alpha: f32,
    force: &mut Vec2,
) {
    if node.count == 0 {
        return;
    }

    let point = positions[index];
    if node.is_leaf() {
        for &other in &node.bodies {
            if other == index {
                continue;
            }
            let (direction, distance) = separation(positions, index, other);
            *force += direction * repulsion_magnitude(distance, params, alpha);
        }
        return;
    }

    let delta = point - node.centroid;
    let distance = delta.length();
    let far_enough = !node.cell.contains(point)
        && distance > COINCIDENT_EPSILON
        && node.cell.side() / distance < params.theta;
    if far_enough {
        *force += (delta / distance)
            * repulsion_magnitude(distance, params, alpha)
            * node.count as f32;
        return;
    }

    for child in node.children() {
        accumulate_repulsion_tree(child, index, positions, params, alpha, force);
    }
}

fn collide(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: Collision,
    forces: &mut [Vec2],
) {
    let contact = radii[from] + radii[to] + params.padding;
    let (direction, distance) = separation(positions, from, to);
    if distance >= contact {
        return;
    }

    let push = direction * ((contact - distance) * params.strength * 0.5);
    forces[from] += push;
    forces[to] -= push;
}

/// Exact collision response, visiting only cell pairs close enough to
/// contain touching bodies.
pub(super) fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: Collision,
    forces: &mut [Vec2],
) {
    if !same_node && node_a.cell.gap_sq(node_b.cell) > params.reach_sq {
        return;
    }

    match (node_a.is_leaf(), node_b.is_leaf()) {
        (true, true) if same_node => {
            for (offset, &from) in node_a.bodies.iter().enumerate() {
                for &to in &node_a.bodies[offset + 1..] {
                    collide(from, to, positions, radii, params, forces);
                }
            }
        }
        (true, true) => {
            for &from in &node_a.bodies {
                for &to in &node_b.bodies {
                    collide(from, to, positions, radii, params, forces);
                }
            }
        }
        _ if same_node => {
            let children = node_a.children().collect::<Vec<_>>();
            for (offset, child) in children.iter().enumerate() {
                accumulate_collisions(child, child, true, positions, radii, params, forces);
                for other in &children[offset + 1..] {
                    accumulate_collisions(child, other, false, positions, radii, params, forces);
                }
            }
        }
        (leaf_a, leaf_b) => {
            let split_a = !leaf_a && (leaf_b || node_a.cell.half_extent >= node_b.cell.half_extent);
            if split_a {
                for child in node_a.children() {
                    accumulate_collisions(child, node_b, false, positions, radii, params, forces);
                }
            } else {
                for child in node_b.children() {
                    accumulate_collisions(node_a, child, false, positions, radii, params, forces);
                }
            }
        }
    }
}

/// Uniform pull of every free body that moves the centroid towards `center`.
pub(super) fn accumulate_centering(
    positions: &[Vec2],
    pinned: &[bool],
    center: Vec2,
    strength: f32,
    alpha: f32,
    forces: &mut [Vec2],
) {
    if positions.is_empty() || strength == 0.0 {
        return;
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, point| sum + *point)
        / positions.len() as f32;
    let shift = (center - centroid) * strength * alpha;
    for (force, &is_pinned) in forces.iter_mut().zip(pinned) {
        if !is_pinned {
            *force += shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    const REPULSION: Repulsion = Repulsion {
        strength: 1000.0,
        distance_min_sq: 1.0,
        theta: 0.72,
    };

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let positions = vec![vec2(0.0, 0.0), vec2(200.0, 0.0)];
        let link = Link::from_degrees(0, 1, &[1, 1]);
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_links(&[link], &positions, 100.0, 1.0, &mut forces);

        assert_eq!(forces[0], vec2(50.0, 0.0));
        assert_eq!(forces[1], vec2(-50.0, 0.0));
    }

    #[test]
    fn hub_links_are_weaker_and_biased_towards_leaves() {
        let link = Link::from_degrees(0, 1, &[4, 1]);
        assert_eq!(link.strength, 1.0);
        assert_eq!(link.bias, 0.8);
        let shared = Link::from_degrees(0, 1, &[4, 2]);
        assert_eq!(shared.strength, 0.5);
    }

    #[test]
    fn repulsion_falls_off_with_squared_distance() {
        let near = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let far = vec![vec2(0.0, 0.0), vec2(20.0, 0.0)];
        let mut near_forces = vec![Vec2::ZERO; 2];
        let mut far_forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion_pairs(&near, REPULSION, 1.0, &mut near_forces);
        accumulate_repulsion_pairs(&far, REPULSION, 1.0, &mut far_forces);

        assert!(near_forces[0].x < 0.0);
        assert!((near_forces[0].x / far_forces[0].x - 4.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_bodies_repel_with_finite_force() {
        let positions = vec![vec2(3.0, 3.0), vec2(3.0, 3.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_repulsion_pairs(&positions, REPULSION, 1.0, &mut forces);

        assert!(forces.iter().all(|force| force.x.is_finite() && force.y.is_finite()));
        assert!((forces[0] + forces[1]).length() < 1e-3);
        assert!(forces[0].length() > 0.0);
    }

    #[test]
    fn barnes_hut_matches_pairs_for_distant_clusters() {
        let mut positions = (0..30)
            .map(|index| vec2((index % 6) as f32 * 4.0, (index / 6) as f32 * 4.0))
            .collect::<Vec<_>>();
        positions.push(vec2(2000.0, 2000.0));
        let probe = positions.len() - 1;

        let mut exact = vec![Vec2::ZERO; positions.len()];
        accumulate_repulsion_pairs(&positions, REPULSION, 1.0, &mut exact);

        let tree = QuadNode::build(&positions).expect("finite positions");
        let mut approximate = Vec2::ZERO;
        accumulate_repulsion_tree(&tree, probe, &positions, REPULSION, 1.0, &mut approximate);

        assert!((exact[probe] - approximate).length() / exact[probe].length() < 0.02);
    }

    #[test]
    fn tree_collisions_match_all_pairs() {
        let positions = (0..60)
            .map(|index| vec2((index % 10) as f32 * 9.0, (index / 10) as f32 * 11.0))
            .collect::<Vec<_>>();
        let radii = vec![6.0; positions.len()];
        let params = Collision {
            strength: 0.7,
            padding: 1.0,
            reach_sq: 13.0 * 13.0,
        };

        let mut exact = vec![Vec2::ZERO; positions.len()];
        for from in 0..positions.len() {
            for to in (from + 1)..positions.len() {
                collide(from, to, &positions, &radii, params, &mut exact);
            }
        }

        let tree = QuadNode::build(&positions).expect("finite positions");
        let mut pruned = vec![Vec2::ZERO; positions.len()];
        accumulate_collisions(&tree, &tree, true, &positions, &radii, params, &mut pruned);

        for (a, b) in exact.iter().zip(&pruned) {
            assert!((*a - *b).length() < 1e-3);
        }
    }

    #[test]
    fn centering_skips_pinned_bodies() {
        let positions = vec![vec2(10.0, 0.0), vec2(30.0, 0.0)];
        let mut forces = vec![Vec2::ZERO; 2];
        accumulate_centering(&positions, &[false, true], Vec2::ZERO, 0.5, 1.0, &mut forces);

        assert_eq!(forces[0], vec2(-10.0, 0.0));
        assert_eq!(forces[1], Vec2::ZERO);
    }
}
