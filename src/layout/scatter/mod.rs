mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use crate::library::{ItemId, rank_order};
use crate::util::stream_for;

use super::continuity::ContinuityMemo;
use super::{CanvasConfig, LayoutNode, SizedItem};
use forces::{
    CollisionParams, ForceScratch, apply_collisions, apply_recentering, apply_target_pull,
    integrate, separation_direction,
};

/// Extra radius every circle keeps clear of its neighbours while simulating.
pub const COLLIDE_PADDING: f32 = 2.0;
/// Sets larger than this skip the overlap scan and cleanup.
pub const CLEANUP_MAX_ITEMS: usize = 150;

const GOLDEN_ANGLE: f32 = 2.399_963_2; // π(3 − √5)
const BLOB_FILL: f32 = 1.15;
const TARGET_JITTER_BASE: f32 = 2.0;
const TARGET_JITTER_FRACTION: f32 = 0.04;
const ANGLE_JITTER: f32 = 0.25;
const START_JITTER_FRACTION: f32 = 0.35;

const ALPHA_MIN: f32 = 0.001;
const VELOCITY_RETAIN: f32 = 0.6;
const MAX_SPEED: f32 = 24.0;

const GATHER_PULL: f32 = 0.08;
const GATHER_COLLISION: CollisionParams = CollisionParams {
    strength: 0.7,
    iterations: 2,
    padding: COLLIDE_PADDING,
};
const SETTLE_COLLISION: CollisionParams = CollisionParams {
    strength: 1.0,
    iterations: 4,
    padding: COLLIDE_PADDING,
};
const CLEANUP_COLLISION: CollisionParams = CollisionParams {
    strength: 1.0,
    iterations: 6,
    padding: COLLIDE_PADDING,
};
const CLEANUP_TICKS: usize = 60;
const CLEANUP_ROUNDS: usize = 3;
const CLEANUP_CENTERING: f32 = 0.05;
const RELAX_SWEEPS: usize = 400;
const RELAX_GAP: f32 = 1.0;
const OVERLAP_TOLERANCE: f32 = 0.5;
const OVERLAP_SCAN_LIMIT: usize = 8;

pub(super) struct ScatterNode {
    id: ItemId,
    radius: f32,
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
}

/// Places `items` as a loose blob around the canvas center.
pub fn compute_scatter_layout(
    items: &[SizedItem],
    seed: u64,
    memo: &ContinuityMemo,
    canvas: &CanvasConfig,
) -> Vec<LayoutNode> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut ordered = items.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| rank_order(&a.item, &b.item));

    let center = canvas.center().to_vec2();
    let max_radius = ordered
        .iter()
        .map(|sized| sized.radius)
        .fold(0.0, f32::max);
    let reuse_prior = memo.radius_stable(max_radius);
    let blob = blob_extent(&ordered, canvas);

    let count = ordered.len();
    let mut nodes = ordered
        .iter()
        .enumerate()
        .map(|(index, sized)| {
            let id = sized.item.id;
            let mut stream = stream_for(id, seed);
            let target = spiral_target(index, count, blob, center, &mut || stream.next_signed());
            let prior = reuse_prior
                .then(|| memo.prior_position(id))
                .flatten()
                .map(|placement| placement.center().to_vec2());
            let start_jitter = sized.radius * START_JITTER_FRACTION + TARGET_JITTER_BASE;
            let position = prior.unwrap_or_else(|| {
                target + vec2(stream.next_signed(), stream.next_signed()) * start_jitter
            });

            ScatterNode {
                id,
                radius: sized.radius,
                position,
                velocity: Vec2::ZERO,
                target,
            }
        })
        .collect::<Vec<_>>();

    let mut scratch = ForceScratch::default();
    clamp_to_canvas(&mut nodes, canvas);

    let gather = gather_ticks(count);
    run_phase(&mut nodes, gather, canvas, &mut scratch, |nodes, alpha, scratch| {
        apply_target_pull(nodes, GATHER_PULL, alpha);
        apply_collisions(nodes, GATHER_COLLISION, scratch);
    });

    let settle = settle_ticks(count);
    run_phase(&mut nodes, settle, canvas, &mut scratch, |nodes, _alpha, scratch| {
        apply_collisions(nodes, SETTLE_COLLISION, scratch);
    });

    if count <= CLEANUP_MAX_ITEMS {
        let remaining = clean_up_overlaps(&mut nodes, center, canvas, &mut scratch);
        if remaining > 0 {
            tracing::debug!(remaining, "scatter overlaps left after cleanup");
        }
    }

    tracing::debug!(count, seed, gather, settle, reuse_prior, "scatter layout done");

    nodes
        .iter()
        .map(|node| LayoutNode {
            id: node.id,
            x: node.position.x,
            y: node.position.y,
            r: node.radius,
        })
        .collect()
}

fn run_phase(
    nodes: &mut [ScatterNode],
    ticks: usize,
    canvas: &CanvasConfig,
    scratch: &mut ForceScratch,
    mut step: impl FnMut(&mut [ScatterNode], f32, &mut ForceScratch),
) {
    let mut alpha = 1.0_f32;
    let alpha_decay = 1.0 - ALPHA_MIN.powf(1.0 / ticks.max(1) as f32);
    for _ in 0..ticks {
        alpha += (0.0 - alpha) * alpha_decay;
        step(nodes, alpha, scratch);
        integrate(nodes, VELOCITY_RETAIN, MAX_SPEED);
        clamp_to_canvas(nodes, canvas);
    }
}

pub(super) fn gather_ticks(count: usize) -> usize {
    (40 + count * 2).clamp(60, 220)
}

pub(super) fn settle_ticks(count: usize) -> usize {
    (80 + count * 3).clamp(120, 360)
}

fn clean_up_overlaps(
    nodes: &mut [ScatterNode],
    center: Vec2,
    canvas: &CanvasConfig,
    scratch: &mut ForceScratch,
) -> usize {
    for round in 0..CLEANUP_ROUNDS {
        let overlaps = count_overlaps(nodes, OVERLAP_TOLERANCE, OVERLAP_SCAN_LIMIT);
        if overlaps == 0 {
            return 0;
        }

        tracing::debug!(round, overlaps, "scatter cleanup pass");
        for node in nodes.iter_mut() {
            node.velocity = Vec2::ZERO;
        }
        run_phase(nodes, CLEANUP_TICKS, canvas, scratch, |nodes, _alpha, scratch| {
            apply_recentering(nodes, center, CLEANUP_CENTERING);
            apply_collisions(nodes, CLEANUP_COLLISION, scratch);
        });
    }

    for sweep in 0..RELAX_SWEEPS {
        if count_overlaps(nodes, OVERLAP_TOLERANCE, 0) == 0 {
            tracing::debug!(sweep, "scatter overlaps separated");
            return 0;
        }
        separate_overlaps(nodes, canvas);
    }
    count_overlaps(nodes, OVERLAP_TOLERANCE, OVERLAP_SCAN_LIMIT)
}

/// Pushes every close pair `RELAX_GAP` apart in one Gauss-Seidel sweep.
fn separate_overlaps(nodes: &mut [ScatterNode], canvas: &CanvasConfig) {
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let ri = nodes[i].radius;
            let rj = nodes[j].radius;
            let reach = ri + rj + RELAX_GAP;

            let delta = nodes[j].position - nodes[i].position;
            let distance_sq = delta.length_sq();
            if distance_sq >= reach * reach {
                continue;
            }

            let distance = distance_sq.sqrt();
            let direction = if distance > 1e-4 {
                delta / distance
            } else {
                separation_direction(i, j)
            };
            let correction = direction * (reach - distance);
            let share = (ri * ri) / (ri * ri + rj * rj);

            nodes[i].position -= correction * (1.0 - share);
            nodes[j].position += correction * share;
            clamp_node(&mut nodes[i], canvas);
            clamp_node(&mut nodes[j], canvas);
        }
    }
}

fn blob_extent(items: &[&SizedItem], canvas: &CanvasConfig) -> Vec2 {
    let area = items
        .iter()
        .map(|sized| (sized.radius + COLLIDE_PADDING).powi(2))
        .sum::<f32>();
    let min_radius = items
        .iter()
        .map(|sized| sized.radius)
        .fold(f32::INFINITY, f32::min);

    let inset = canvas.outer_padding + min_radius;
    let half_width = (canvas.width * 0.5 - inset).max(0.0);
    let half_height = (canvas.height * 0.5 - inset).max(0.0);
    let aspect = if half_width > 0.0 && half_height > 0.0 {
        (half_width / half_height).sqrt()
    } else {
        1.0
    };

    let radius = area.sqrt() * BLOB_FILL;
    vec2(
        (radius * aspect).min(half_width),
        (radius / aspect).min(half_height),
    )
}

fn spiral_target(
    index: usize,
    count: usize,
    blob: Vec2,
    center: Vec2,
    jitter: &mut impl FnMut() -> f32,
) -> Vec2 {
    let spread = if count > 1 {
        (index as f32 / (count - 1) as f32).sqrt()
    } else {
        0.0
    };
    let angle = index as f32 * GOLDEN_ANGLE + jitter() * ANGLE_JITTER;
    let amplitude = blob.min_elem() * TARGET_JITTER_FRACTION + TARGET_JITTER_BASE;
    let offset = vec2(jitter(), jitter()) * amplitude;
    center + vec2(angle.cos() * blob.x, angle.sin() * blob.y) * spread + offset
}

fn clamp_to_canvas(nodes: &mut [ScatterNode], canvas: &CanvasConfig) {
    for node in nodes {
        clamp_node(node, canvas);
    }
}

fn clamp_node(node: &mut ScatterNode, canvas: &CanvasConfig) {
    let margin = node.radius + canvas.outer_padding;
    let x = clamp_axis(node.position.x, margin, canvas.width);
    let y = clamp_axis(node.position.y, margin, canvas.height);
    if x != node.position.x {
        node.velocity.x = 0.0;
    }
    if y != node.position.y {
        node.velocity.y = 0.0;
    }
    node.position = vec2(x, y);
}

fn clamp_axis(value: f32, margin: f32, extent: f32) -> f32 {
    let low = margin;
    let high = extent - margin;
    if low > high {
        extent * 0.5
    } else {
        value.clamp(low, high)
    }
}

/// Counts overlapping pairs, stopping once `limit` is exceeded.
fn count_overlaps(nodes: &[ScatterNode], tolerance: f32, limit: usize) -> usize {
    let mut count = 0;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let min_distance = a.radius + b.radius - tolerance;
            if min_distance > 0.0
                && (a.position - b.position).length_sq() < min_distance * min_distance
            {
                count += 1;
                if count > limit {
                    return count;
                }
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::sizing::size_items;
    use crate::library::Item;

    const WEIGHTS: [f64; 12] = [100.0, 50.0, 25.0, 12.0, 8.0, 5.0, 3.0, 2.0, 1.0, 1.0, 0.5, 0.2];

    fn canvas() -> CanvasConfig {
        CanvasConfig {
            width: 800.0,
            height: 800.0,
            outer_padding: 16.0,
        }
    }

    fn item(id: ItemId, weight: f64) -> Item {
        Item {
            id,
            name: format!("Game {id}"),
            weight,
            image_ref: String::new(),
            link_ref: String::new(),
            is_manual: false,
        }
    }

    fn library() -> Vec<SizedItem> {
        let items = WEIGHTS
            .iter()
            .enumerate()
            .map(|(index, &weight)| item(1000 + index as u64 * 17, weight))
            .collect::<Vec<_>>();
        size_items(&items, canvas().min_dim())
    }

    fn assert_no_overlap(nodes: &[LayoutNode], epsilon: f32) {
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                let distance = (a.x - b.x).hypot(a.y - b.y);
                assert!(
                    distance >= a.r + b.r - epsilon,
                    "{} and {} overlap: {distance} < {}",
                    a.id,
                    b.id,
                    a.r + b.r
                );
            }
        }
    }

    #[test]
    fn empty_set_yields_empty_layout() {
        assert!(compute_scatter_layout(&[], 1, &ContinuityMemo::new(), &canvas()).is_empty());
    }

    #[test]
    fn identical_inputs_give_identical_positions() {
        let memo = ContinuityMemo::new();
        let first = compute_scatter_layout(&library(), 42, &memo, &canvas());
        let second = compute_scatter_layout(&library(), 42, &memo, &canvas());
        assert_eq!(first, second);
    }

    #[test]
    fn input_order_does_not_matter() {
        let memo = ContinuityMemo::new();
        let forward = compute_scatter_layout(&library(), 9, &memo, &canvas());
        let mut shuffled = library();
        shuffled.reverse();
        shuffled.swap(2, 7);
        assert_eq!(compute_scatter_layout(&shuffled, 9, &memo, &canvas()), forward);
    }

    #[test]
    fn seed_changes_the_arrangement() {
        let memo = ContinuityMemo::new();
        let a = compute_scatter_layout(&library(), 1, &memo, &canvas());
        let b = compute_scatter_layout(&library(), 2, &memo, &canvas());
        assert_ne!(a, b);
    }

    #[test]
    fn small_sets_end_without_overlaps() {
        for seed in [0, 1, 7, 12345] {
            let nodes = compute_scatter_layout(&library(), seed, &ContinuityMemo::new(), &canvas());
            assert_eq!(nodes.len(), WEIGHTS.len());
            assert_no_overlap(&nodes, 0.5);
        }
    }

    #[test]
    fn circles_stay_inside_canvas() {
        let canvas = canvas();
        let nodes = compute_scatter_layout(&library(), 3, &ContinuityMemo::new(), &canvas);
        for node in &nodes {
            let margin = node.r + canvas.outer_padding - 1e-3;
            assert!(node.x >= margin && node.x <= canvas.width - margin);
            assert!(node.y >= margin && node.y <= canvas.height - margin);
        }
    }

    #[test]
    fn recomputing_from_own_memo_stays_overlap_free() {
        let mut memo = ContinuityMemo::new();
        let first = compute_scatter_layout(&library(), 5, &memo, &canvas());
        memo.record_positions(&first);
        let second = compute_scatter_layout(&library(), 5, &memo, &canvas());
        assert_eq!(second.len(), first.len());
        assert_no_overlap(&second, 0.5);
    }

    #[test]
    fn spiral_targets_fill_the_disk() {
        let center = vec2(100.0, 100.0);
        let mut no_jitter = || 0.0;
        let blob = vec2(50.0, 50.0);
        assert_eq!(spiral_target(0, 10, blob, center, &mut no_jitter), center);
        let outer = spiral_target(9, 10, blob, center, &mut no_jitter);
        assert!(((outer - center).length() - 50.0).abs() < 1e-3);
        assert_eq!(spiral_target(0, 1, blob, center, &mut no_jitter), center);
    }

    #[test]
    fn blob_follows_canvas_aspect() {
        let wide = CanvasConfig {
            width: 1200.0,
            height: 400.0,
            outer_padding: 16.0,
        };
        let sized = library();
        let refs = sized.iter().collect::<Vec<_>>();
        let blob = blob_extent(&refs, &wide);
        let min_radius = sized.iter().map(|s| s.radius).fold(f32::INFINITY, f32::min);

        assert!(blob.x > blob.y);
        assert!(blob.x <= 600.0 - 16.0 - min_radius);
        assert!(blob.y <= 200.0 - 16.0 - min_radius);
    }

    fn heavy_tail(count: u64) -> Vec<SizedItem> {
        let items = (0..count)
            .map(|index| item(10 + index, 3000.0 / (index as f64 + 1.0)))
            .collect::<Vec<_>>();
        size_items(&items, CanvasConfig::default().min_dim())
    }

    #[test]
    fn heavy_tail_at_cleanup_threshold_ends_without_overlaps() {
        let canvas = CanvasConfig::default();
        let sized = heavy_tail(CLEANUP_MAX_ITEMS as u64);
        for seed in [0, 1, 3] {
            let nodes = compute_scatter_layout(&sized, seed, &ContinuityMemo::new(), &canvas);
            assert_eq!(nodes.len(), CLEANUP_MAX_ITEMS);
            assert_no_overlap(&nodes, 0.5);
            for node in &nodes {
                let margin = node.r + canvas.outer_padding - 1e-3;
                assert!(node.x >= margin && node.x <= canvas.width - margin);
                assert!(node.y >= margin && node.y <= canvas.height - margin);
            }
        }

        let nodes = compute_scatter_layout(&heavy_tail(100), 2, &ContinuityMemo::new(), &canvas);
        assert_no_overlap(&nodes, 0.5);
    }

    fn resting(id: ItemId, x: f32, y: f32, radius: f32) -> ScatterNode {
        ScatterNode {
            id,
            radius,
            position: vec2(x, y),
            velocity: Vec2::ZERO,
            target: vec2(x, y),
        }
    }

    #[test]
    fn separation_moves_the_smaller_circle_further() {
        let mut nodes = vec![resting(1, 400.0, 400.0, 30.0), resting(2, 420.0, 400.0, 10.0)];
        separate_overlaps(&mut nodes, &canvas());

        let distance = (nodes[1].position - nodes[0].position).length();
        assert!((distance - (40.0 + RELAX_GAP)).abs() < 1e-3);
        let big_moved = (nodes[0].position - vec2(400.0, 400.0)).length();
        let small_moved = (nodes[1].position - vec2(420.0, 400.0)).length();
        assert!(small_moved > big_moved);
    }

    #[test]
    fn separation_against_a_wall_converges_inside_canvas() {
        let canvas = canvas();
        let wall = canvas.outer_padding + 20.0;
        let mut nodes = vec![
            resting(1, wall, 400.0, 20.0),
            resting(2, wall + 5.0, 400.0, 20.0),
            resting(3, wall + 5.0, 400.0, 20.0),
        ];
        let remaining = clean_up_overlaps(
            &mut nodes,
            canvas.center().to_vec2(),
            &canvas,
            &mut ForceScratch::default(),
        );

        assert_eq!(remaining, 0);
        for node in &nodes {
            assert!(node.position.x >= node.radius + canvas.outer_padding - 1e-3);
        }
    }

    #[test]
    fn tick_budgets_are_bounded() {
        assert_eq!(gather_ticks(0), 60);
        assert_eq!(gather_ticks(1_000), 220);
        assert_eq!(settle_ticks(1), 120);
        assert_eq!(settle_ticks(1_000), 360);
    }

    #[test]
    fn overlap_scan_stops_early() {
        let nodes = (0..20)
            .map(|index| ScatterNode {
                id: index,
                radius: 10.0,
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
                target: Vec2::ZERO,
            })
            .collect::<Vec<_>>();
        assert_eq!(count_overlaps(&nodes, 0.5, 3), 4);
    }
}
