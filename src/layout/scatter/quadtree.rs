use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
struct Cell {
    min: Vec2,
    side: f32,
}

impl Cell {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), point| (min.min(*point), max.max(*point)));
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = max - min;
        let side = span.x.max(span.y).max(1.0) + 2.0;
        Some(Self {
            min: (min + max) * 0.5 - Vec2::splat(side * 0.5),
            side,
        })
    }

    fn quadrant(self, point: Vec2) -> usize {
        let half = self.side * 0.5;
        let east = point.x >= self.min.x + half;
        let south = point.y >= self.min.y + half;
        usize::from(east) | (usize::from(south) << 1)
    }

    fn quadrant_cell(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let offset = vec2((quadrant & 1) as f32, (quadrant >> 1) as f32) * half;
        Self {
            min: self.min + offset,
            side: half,
        }
    }

    fn gap_sq(self, other: Self) -> f32 {
        let axis_gap = |a_min: f32, b_min: f32| {
            (a_min - (b_min + other.side))
                .max(b_min - (a_min + self.side))
                .max(0.0)
        };
        let dx = axis_gap(self.min.x, other.min.x);
        let dy = axis_gap(self.min.y, other.min.y);
        (dx * dx) + (dy * dy)
    }
}

pub(super) struct QuadNode {
    cell: Cell,
    members: Vec<usize>,
    children: Vec<QuadNode>,
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let cell = Cell::enclosing(positions)?;
        Some(Self::split(cell, (0..positions.len()).collect(), positions, 0))
    }

    fn split(cell: Cell, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        if depth < MAX_DEPTH && members.len() > LEAF_CAPACITY {
            let mut buckets: [Vec<usize>; 4] = Default::default();
            for &index in &members {
                buckets[cell.quadrant(positions[index])].push(index);
            }

            if buckets.iter().filter(|bucket| !bucket.is_empty()).count() > 1 {
                let children = buckets
                    .into_iter()
                    .enumerate()
                    .filter(|(_, bucket)| !bucket.is_empty())
                    .map(|(quadrant, bucket)| {
                        Self::split(cell.quadrant_cell(quadrant), bucket, positions, depth + 1)
                    })
                    .collect();
                return Self {
                    cell,
                    members: Vec::new(),
                    children,
                };
            }
        }

        Self {
            cell,
            members,
            children: Vec::new(),
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Pairs `(i, j)` with `i < j` whose circles, inflated by `slack`, touch.
pub(super) fn collect_contact_pairs(
    tree: &QuadNode,
    positions: &[Vec2],
    radii: &[f32],
    slack: f32,
    max_contact: f32,
    pairs: &mut Vec<(usize, usize)>,
) {
    pairs.clear();
    let params = ContactParams {
        slack,
        max_contact_sq: max_contact * max_contact,
    };
    visit_pairs(tree, tree, true, positions, radii, params, pairs);
}

#[derive(Clone, Copy)]
struct ContactParams {
    slack: f32,
    max_contact_sq: f32,
}

fn push_if_touching(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: ContactParams,
    pairs: &mut Vec<(usize, usize)>,
) {
    let reach = radii[from] + radii[to] + params.slack;
    if (positions[from] - positions[to]).length_sq() < reach * reach {
        pairs.push((from.min(to), from.max(to)));
    }
}

fn visit_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: ContactParams,
    pairs: &mut Vec<(usize, usize)>,
) {
    if node_a.cell.gap_sq(node_b.cell) > params.max_contact_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.members.iter().enumerate() {
                for &to in &node_a.members[offset + 1..] {
                    push_if_touching(from, to, positions, radii, params, pairs);
                }
            }
        } else {
            for &from in &node_a.members {
                for &to in &node_b.members {
                    push_if_touching(from, to, positions, radii, params, pairs);
                }
            }
        }
        return;
    }

    if same_node {
        for (offset, child_a) in node_a.children.iter().enumerate() {
            visit_pairs(child_a, child_a, true, positions, radii, params, pairs);
            for child_b in &node_a.children[offset + 1..] {
                visit_pairs(child_a, child_b, false, positions, radii, params, pairs);
            }
        }
        return;
    }

    let split_a = !node_a.is_leaf() && (node_b.is_leaf() || node_a.cell.side >= node_b.cell.side);
    if split_a {
        for child in &node_a.children {
            visit_pairs(child, node_b, false, positions, radii, params, pairs);
        }
    } else {
        for child in &node_b.children {
            visit_pairs(node_a, child, false, positions, radii, params, pairs);
        }
    }
}
