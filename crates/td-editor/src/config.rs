//! Interaction tuning.

use crate::threshold::DEFAULT_THRESHOLD_PX;
use serde::{Deserialize, Serialize};
use td_core::DrawingKind;
use td_hit::HitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    #[serde(flatten)]
    pub hit: HitConfig,
    /// Pointer travel before a press becomes a drag.
    pub drag_threshold: f64,
    /// Travel before a position handle starts moving. Position handles sit
    /// close together, so this may be set higher than `drag_threshold`.
    pub position_drag_threshold: f64,
    /// Default width of a new position, in bars.
    pub position_bars: f64,
    /// Default target distance from entry, as a fraction of the entry price.
    pub position_target_pct: f64,
    /// Default stop distance from entry, as a fraction of the entry price.
    pub position_stop_pct: f64,
    /// Undo history depth.
    pub undo_depth: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit: HitConfig::default(),
            drag_threshold: DEFAULT_THRESHOLD_PX,
            position_drag_threshold: DEFAULT_THRESHOLD_PX,
            position_bars: 20.0,
            position_target_pct: 0.02,
            position_stop_pct: 0.01,
            undo_depth: 200,
        }
    }
}

impl InteractionConfig {
    pub fn threshold_for(&self, kind: DrawingKind) -> f64 {
        match kind {
            DrawingKind::Position(_) => self.position_drag_threshold,
            _ => self.drag_threshold,
        }
    }

    /// Parse from host JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
