use eframe::egui::{Vec2, vec2};

use super::ScatterNode;
use super::quadtree::{QuadNode, collect_contact_pairs};

const COINCIDENT_EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) iterations: usize,
    pub(super) padding: f32,
}

#[derive(Default)]
pub(super) struct ForceScratch {
    predicted: Vec<Vec2>,
    radii: Vec<f32>,
    pairs: Vec<(usize, usize)>,
}

pub(super) fn apply_target_pull(nodes: &mut [ScatterNode], strength: f32, alpha: f32) {
    let scale = strength * alpha;
    for node in nodes {
        node.velocity += (node.target - node.position) * scale;
    }
}

/// Pairwise collision: overlapping circles (radius plus padding) push apart
/// along their center line, the lighter circle moving further.
pub(super) fn apply_collisions(
    nodes: &mut [ScatterNode],
    params: CollisionParams,
    scratch: &mut ForceScratch,
) {
    if nodes.len() < 2 || params.iterations == 0 {
        return;
    }

    scratch.radii.clear();
    scratch
        .radii
        .extend(nodes.iter().map(|node| node.radius + params.padding));
    let max_radius = scratch.radii.iter().copied().fold(0.0, f32::max);
    let slack = params.padding;

    for _ in 0..params.iterations {
        scratch.predicted.clear();
        scratch
            .predicted
            .extend(nodes.iter().map(|node| node.position + node.velocity));

        let Some(tree) = QuadNode::build(&scratch.predicted) else {
            return;
        };
        collect_contact_pairs(
            &tree,
            &scratch.predicted,
            &scratch.radii,
            slack,
            (max_radius * 2.0) + slack,
            &mut scratch.pairs,
        );

        for &(i, j) in &scratch.pairs {
            let ri = scratch.radii[i];
            let rj = scratch.radii[j];
            let reach = ri + rj;

            let mut delta = (nodes[i].position + nodes[i].velocity)
                - (nodes[j].position + nodes[j].velocity);
            let mut distance_sq = delta.length_sq();
            if distance_sq >= reach * reach {
                continue;
            }

            if distance_sq < COINCIDENT_EPSILON {
                delta = separation_direction(i, j) * 1e-3;
                distance_sq = delta.length_sq();
            }

            let distance = distance_sq.sqrt();
            let push = delta * ((reach - distance) / distance * params.strength);
            let share = (rj * rj) / (ri * ri + rj * rj);

            nodes[i].velocity += push * share;
            nodes[j].velocity -= push * (1.0 - share);
        }
    }
}

/// Fixed unit direction for pulling apart two circles with coincident centers.
pub(super) fn separation_direction(i: usize, j: usize) -> Vec2 {
    let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Moves the whole set a fraction of the way toward `center` without changing
/// relative positions.
pub(super) fn apply_recentering(nodes: &mut [ScatterNode], center: Vec2, strength: f32) {
    if nodes.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for node in nodes.iter() {
        centroid += node.position;
    }
    centroid /= nodes.len() as f32;

    let shift = (center - centroid) * strength;
    if shift.length_sq() > 0.000_001 {
        for node in nodes.iter_mut() {
            node.position += shift;
        }
    }
}

/// Applies velocity decay and the speed cap, then advances positions.
pub(super) fn integrate(nodes: &mut [ScatterNode], velocity_retain: f32, max_speed: f32) {
    let max_speed_sq = max_speed * max_speed;
    for node in nodes {
        let mut velocity = node.velocity * velocity_retain;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= max_speed / speed_sq.sqrt();
        }
        node.velocity = velocity;
        node.position += velocity;
    }
}
