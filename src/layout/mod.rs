mod continuity;
mod packed;
mod scatter;
mod sizing;

use std::fmt;
use std::str::FromStr;

use eframe::egui::{Pos2, pos2};
use serde::{Deserialize, Serialize};

use crate::library::{Item, ItemId};

pub use continuity::{ContinuityMemo, NodeTransition, Placement, transitions};
pub use packed::{PACK_PADDING, compute_packed_layout};
pub use scatter::{CLEANUP_MAX_ITEMS, COLLIDE_PADDING, compute_scatter_layout};
pub use sizing::{MIN_RADIUS, radius, size_items, weight_domain_max};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Packed,
    Scatter,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Packed => "packed",
            Self::Scatter => "scatter",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "packed" | "pack" => Ok(Self::Packed),
            "scatter" | "blob" => Ok(Self::Scatter),
            other => Err(format!("unknown layout mode `{other}` (expected packed or scatter)")),
        }
    }
}

/// Fixed drawing area the layouts place circles into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub outer_padding: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            outer_padding: 16.0,
        }
    }
}

impl CanvasConfig {
    pub fn min_dim(&self) -> f32 {
        self.width.min(self.height).max(0.0)
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width * 0.5, self.height * 0.5)
    }

    /// Radius of the largest centered disk that respects the outer padding.
    pub fn available_radius(&self) -> f32 {
        (self.min_dim() * 0.5 - self.outer_padding).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SizedItem {
    pub item: Item,
    pub radius: f32,
}

/// A positioned circle in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: ItemId,
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl LayoutNode {
    pub fn center(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

/// Sizes `items` against the canvas and lays them out in `mode`.
pub fn compute_layout(
    mode: LayoutMode,
    items: &[Item],
    seed: u64,
    memo: &ContinuityMemo,
    canvas: &CanvasConfig,
) -> Vec<LayoutNode> {
    let sized = size_items(items, canvas.min_dim());
    match mode {
        LayoutMode::Packed => compute_packed_layout(&sized, canvas),
        LayoutMode::Scatter => compute_scatter_layout(&sized, seed, memo, canvas),
    }
}
