use std::collections::HashMap;

use eframe::egui::emath::lerp;
use eframe::egui::{Pos2, pos2};

use crate::library::ItemId;

use super::LayoutNode;

/// Fraction the largest radius may drift before prior positions go stale.
pub const RADIUS_STALE_RATIO: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl Placement {
    pub fn center(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

/// Last emitted geometry per item id, plus the largest radius of that pass.
#[derive(Clone, Debug, Default)]
pub struct ContinuityMemo {
    positions: HashMap<ItemId, Placement>,
    max_radius: Option<f32>,
}

impl ContinuityMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn record_positions(&mut self, nodes: &[LayoutNode]) {
        for node in nodes {
            self.positions.insert(
                node.id,
                Placement {
                    x: node.x,
                    y: node.y,
                    r: node.r,
                },
            );
        }
        if !nodes.is_empty() {
            self.max_radius = Some(nodes.iter().map(|node| node.r).fold(0.0, f32::max));
        }
    }

    pub fn prior_position(&self, id: ItemId) -> Option<Placement> {
        self.positions.get(&id).copied()
    }

    pub fn max_radius(&self) -> Option<f32> {
        self.max_radius
    }

    pub fn radius_stable(&self, current_max: f32) -> bool {
        let Some(previous) = self.max_radius else {
            return false;
        };
        if previous <= f32::EPSILON {
            return current_max <= f32::EPSILON;
        }
        ((current_max - previous).abs() / previous) <= RADIUS_STALE_RATIO
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeTransition {
    pub id: ItemId,
    pub from: Option<Placement>,
    pub to: LayoutNode,
}

impl NodeTransition {
    /// Geometry at progress `t` in `[0, 1]`, eased out. Items without history
    /// grow in place from zero radius.
    pub fn at(&self, t: f32) -> LayoutNode {
        let t = ease_out_cubic(t.clamp(0.0, 1.0));
        let (x, y, r) = match self.from {
            Some(from) => (from.x, from.y, from.r),
            None => (self.to.x, self.to.y, 0.0),
        };

        LayoutNode {
            id: self.id,
            x: lerp(x..=self.to.x, t),
            y: lerp(y..=self.to.y, t),
            r: lerp(r..=self.to.r, t),
        }
    }

    pub fn is_new(&self) -> bool {
        self.from.is_none()
    }
}

pub fn transitions(memo: &ContinuityMemo, nodes: &[LayoutNode]) -> Vec<NodeTransition> {
    nodes
        .iter()
        .map(|node| NodeTransition {
            id: node.id,
            from: memo.prior_position(node.id),
            to: *node,
        })
        .collect()
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
