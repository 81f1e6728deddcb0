use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct Cell {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Cell {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared gap between two cells; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let x = if quadrant & 1 == 0 { -quarter } else { quarter };
        let y = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(x, y),
            half_extent: quarter,
        }
    }
}

/// Region quadtree over body positions. Leaves hold body indices; every
/// node tracks the count and centroid of the bodies below it.
pub(super) struct QuadNode {
    pub(super) cell: Cell,
    pub(super) centroid: Vec2,
    pub(super) count: usize,
    pub(super) bodies: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let cell = Cell::enclosing(positions)?;
        Some(Self::subdivide(cell, (0..positions.len()).collect(), positions, 0))
    }

    fn subdivide(cell: Cell, bodies: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let count = bodies.len();
        let centroid = if count == 0 {
            cell.center
        } else {
            bodies
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / count as f32
        };

        let mut node = Self {
            cell,
            centroid,
            count,
            bodies,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || count <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &node.bodies {
            buckets[cell.quadrant_of(positions[index])].push(index);
        }
        // All bodies in one quadrant means they are stacked; splitting would not separate them.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::subdivide(
                    cell.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.bodies.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_leaf_bodies(node: &QuadNode, out: &mut Vec<usize>) {
        if node.is_leaf() {
            out.extend_from_slice(&node.bodies);
        }
        for child in node.children() {
            collect_leaf_bodies(child, out);
        }
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let positions = (0..200)
            .map(|index| vec2((index % 17) as f32 * 13.0, (index / 17) as f32 * 7.0))
            .collect::<Vec<_>>();
        let tree = QuadNode::build(&positions).expect("finite positions");

        let mut bodies = Vec::new();
        collect_leaf_bodies(&tree, &mut bodies);
        bodies.sort_unstable();
        assert_eq!(bodies, (0..200).collect::<Vec<_>>());
        assert_eq!(tree.count, 200);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn stacked_bodies_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 40];
        let tree = QuadNode::build(&positions).expect("finite positions");
        assert!(tree.is_leaf());
        assert_eq!(tree.bodies.len(), 40);
    }

    #[test]
    fn non_finite_positions_build_nothing() {
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadNode::build(&[]).is_none());
    }

    #[test]
    fn cell_gap_is_zero_for_touching_cells() {
        let a = Cell {
            center: vec2(0.0, 0.0),
            half_extent: 1.0,
        };
        let b = Cell {
            center: vec2(2.0, 0.0),
            half_extent: 1.0,
        };
        let c = Cell {
            center: vec2(4.0, 4.0),
            half_extent: 1.0,
        };
        assert_eq!(a.gap_sq(b), 0.0);
        assert_eq!(a.gap_sq(c), 2.0 * 2.0 + 2.0 * 2.0);
    }
}
