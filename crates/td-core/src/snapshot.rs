//! Plain-data snapshots for persistence and sync.
//!
//! A snapshot carries exactly what is needed to rebuild a drawing: kind,
//! control points as time + price pairs, style options, and the stable id.
//! Cached logical indices, UI flags, and derived geometry are never stored;
//! they are recomputed on hydration.

use crate::error::TdError;
use crate::id::DrawingId;
use crate::model::{BarSeries, Drawing, DrawingKind, DrawingOptions, LogicalPoint, Side, UnixTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPoint {
    pub time: UnixTime,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingSnapshot {
    pub id: DrawingId,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: Vec<SnapshotPoint>,
    #[serde(default)]
    pub options: DrawingOptions,
}

impl DrawingKind {
    pub fn from_name(name: &str) -> Result<Self, TdError> {
        Ok(match name {
            "line" | "trendline" => DrawingKind::Line,
            "box" | "rectangle" => DrawingKind::Box,
            "fib_retracement" => DrawingKind::FibRetracement,
            "ruler" => DrawingKind::Ruler,
            "long_position" => DrawingKind::Position(Side::Long),
            "short_position" => DrawingKind::Position(Side::Short),
            other => return Err(TdError::UnknownKind(other.to_string())),
        })
    }
}

impl Drawing {
    /// Capture the persistent state of this drawing. Points that only carry
    /// a logical index get a time extrapolated from `series`.
    pub fn snapshot(&self, series: &BarSeries) -> Result<DrawingSnapshot, TdError> {
        let points = self
            .points()
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let time = p.resolved_time(series).ok_or_else(|| TdError::UnresolvedTime {
                    id: self.id.to_string(),
                    index,
                })?;
                Ok(SnapshotPoint { time, price: p.price })
            })
            .collect::<Result<Vec<_>, TdError>>()?;

        Ok(DrawingSnapshot {
            id: self.id,
            kind: self.kind.name().to_string(),
            points,
            options: self.options.clone(),
        })
    }
}

impl DrawingSnapshot {
    /// Rebuild a drawing, computing geometry against `series`.
    pub fn hydrate(&self, series: &BarSeries) -> Result<Drawing, TdError> {
        let kind = DrawingKind::from_name(&self.kind)?;
        let points = self.points.iter().map(|p| LogicalPoint::new(p.time, p.price));
        Drawing::new(self.id, kind, points, self.options.clone(), series)
    }

    pub fn to_json(&self) -> Result<String, TdError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, TdError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compact binary form for local caches.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, TdError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, TdError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Snapshot every drawing that can be placed in time, skipping (and
/// logging) the ones that can't.
pub fn snapshot_all<'a>(
    drawings: impl IntoIterator<Item = &'a Drawing>,
    series: &BarSeries,
) -> Vec<DrawingSnapshot> {
    drawings
        .into_iter()
        .filter(|d| !d.is_preview)
        .filter_map(|d| match d.snapshot(series) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("skipping snapshot: {e}");
                None
            }
        })
        .collect()
}
