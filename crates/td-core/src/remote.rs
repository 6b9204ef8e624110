//! Import of drawings pushed by the backend.
//!
//! The server emits drawing records over a socket as `chart_drawing_received`,
//! `chart_drawing_updated` and `chart_drawing_deleted` events, and replays
//! missed ones as undelivered records with an explicit `action`. Records
//! use wall-clock timestamps (RFC 3339 strings, Unix seconds, or the literal
//! `"relative"`), so they are resolved against the current bar series on
//! import.

use crate::error::TdError;
use crate::id::DrawingId;
use crate::model::{
    BarSeries, Color, Drawing, DrawingKind, DrawingOptions, LineStyle, LogicalPoint, Side, UnixTime,
};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

/// Candles past the latest bar that a `"relative"` time points at.
pub const RELATIVE_LOOKAHEAD_BARS: i64 = 10;

// ─── Payload shapes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeRef {
    Unix(UnixTime),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    pub time: TimeRef,
    pub price: f64,
}

/// Server-side style block. Boxes use `border*`, lines use `color`/`width`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStyle {
    pub border_color: Option<String>,
    pub border_width: Option<f32>,
    pub fill_color: Option<String>,
    pub color: Option<String>,
    pub width: Option<f32>,
    pub style: Option<LineStyle>,
}

/// One drawing record as the backend sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub start_time: Option<TimeRef>,
    #[serde(default)]
    pub end_time: Option<TimeRef>,
    #[serde(default)]
    pub start_price: Option<f64>,
    #[serde(default)]
    pub end_price: Option<f64>,
    #[serde(default)]
    pub entry: Option<PricePoint>,
    #[serde(default)]
    pub target: Option<PricePoint>,
    #[serde(default)]
    pub stop: Option<PricePoint>,
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub stop_price: Option<f64>,
    #[serde(default)]
    pub style: Option<PayloadStyle>,
    #[serde(default)]
    pub options: Option<DrawingOptions>,
}

// ─── Time resolution ─────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DD[T ]HH:MM:SS` taken
/// as UTC.
pub fn parse_timestamp(value: &str) -> Result<UnixTime, TdError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| TdError::BadTimestamp {
            value: value.to_string(),
            reason: "expected RFC 3339 or `relative`".into(),
        })
}

impl TimeRef {
    /// Resolve to a bar time. Explicit times inside the loaded range snap to
    /// the nearest candle; times outside it are kept as-is and extrapolated
    /// at render time.
    pub fn resolve(&self, series: &BarSeries) -> Result<UnixTime, TdError> {
        let raw = match self {
            TimeRef::Unix(t) => *t,
            TimeRef::Text(s) if s.eq_ignore_ascii_case("relative") => {
                let last = series.last().ok_or(TdError::NoBars("relative"))?;
                let interval = series.trailing_interval().ok_or(TdError::NoBars("relative"))?;
                return Ok(last.time + RELATIVE_LOOKAHEAD_BARS * interval);
            }
            TimeRef::Text(s) => parse_timestamp(s)?,
        };
        Ok(snap_to_candle(series, raw))
    }
}

fn snap_to_candle(series: &BarSeries, time: UnixTime) -> UnixTime {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if first.time <= time && time <= last.time => series
            .nearest_index(time)
            .and_then(|i| series.get(i))
            .map_or(time, |b| b.time),
        _ => time,
    }
}

// ─── Conversion ──────────────────────────────────────────────────────────

impl PayloadStyle {
    fn apply(&self, options: &mut DrawingOptions) {
        if let Some(c) = self.border_color.as_deref().or(self.color.as_deref()) {
            match Color::from_css(c) {
                Some(color) => options.line_color = color,
                None => log::warn!("ignoring unparseable color `{c}`"),
            }
        }
        if let Some(w) = self.border_width.or(self.width) {
            options.line_width = w;
        }
        if let Some(c) = self.fill_color.as_deref() {
            match Color::from_css(c) {
                Some(color) => options.fill_color = Some(color),
                None => log::warn!("ignoring unparseable fill `{c}`"),
            }
        }
        if let Some(style) = self.style {
            options.line_style = style;
        }
    }
}

impl DrawingPayload {
    pub fn drawing_kind(&self) -> Result<DrawingKind, TdError> {
        DrawingKind::from_name(&self.kind)
    }

    pub fn options(&self) -> DrawingOptions {
        let mut options = self.options.clone().unwrap_or_default();
        if let Some(style) = &self.style {
            style.apply(&mut options);
        }
        options
    }

    fn points(&self, kind: DrawingKind, series: &BarSeries) -> Result<Vec<LogicalPoint>, TdError> {
        let name = kind.name();
        let need = |v: Option<f64>, field: &'static str| v.ok_or(TdError::MissingField { kind: name, field });
        let need_time = |t: &Option<TimeRef>, field: &'static str| -> Result<UnixTime, TdError> {
            t.as_ref()
                .ok_or(TdError::MissingField { kind: name, field })?
                .resolve(series)
        };

        match kind {
            DrawingKind::Position(_) => {
                // Either `entry`/`target`/`stop` objects or flat start/end + prices.
                let (entry_time, entry_price) = match &self.entry {
                    Some(p) => (p.time.resolve(series)?, p.price),
                    None => (need_time(&self.start_time, "startTime")?, need(self.entry_price, "entryPrice")?),
                };
                let (target_time, target_price) = match &self.target {
                    Some(p) => (p.time.resolve(series)?, p.price),
                    None => (need_time(&self.end_time, "endTime")?, need(self.target_price, "targetPrice")?),
                };
                let stop_price = match &self.stop {
                    Some(p) => p.price,
                    None => need(self.stop_price, "stopPrice")?,
                };
                Ok(vec![
                    LogicalPoint::new(entry_time, entry_price),
                    LogicalPoint::new(target_time, target_price),
                    LogicalPoint::new(entry_time, stop_price),
                ])
            }
            _ => Ok(vec![
                LogicalPoint::new(need_time(&self.start_time, "startTime")?, need(self.start_price, "startPrice")?),
                LogicalPoint::new(need_time(&self.end_time, "endTime")?, need(self.end_price, "endPrice")?),
            ]),
        }
    }

    /// Build a drawing. The id comes from the payload, then `id`, and is
    /// generated when neither is present.
    pub fn into_drawing(&self, id: Option<DrawingId>, series: &BarSeries) -> Result<Drawing, TdError> {
        let kind = self.drawing_kind()?;
        let points = self.points(kind, series)?;
        let id = self
            .id
            .as_deref()
            .map(DrawingId::intern)
            .or(id)
            .unwrap_or_else(DrawingId::generate);
        Drawing::new(id, kind, points, self.options(), series)
    }
}

// ─── Sync messages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Create {
        symbol: String,
        drawing: DrawingPayload,
    },
    Update {
        symbol: String,
        id: DrawingId,
        drawing: DrawingPayload,
    },
    Delete {
        symbol: String,
        id: DrawingId,
    },
}

#[derive(Deserialize)]
struct Envelope {
    symbol: String,
    #[serde(default)]
    drawing_id: Option<String>,
    #[serde(default)]
    drawing_data: Option<DrawingPayload>,
    #[serde(default)]
    action: Option<String>,
}

impl SyncMessage {
    /// Decode a socket event by name.
    pub fn from_event(event: &str, json: &str) -> Result<Self, TdError> {
        let action = match event {
            "chart_drawing_received" => "create",
            "chart_drawing_updated" => "update",
            "chart_drawing_deleted" => "delete",
            other => return Err(TdError::UnknownEvent(other.to_string())),
        };
        let envelope: Envelope = serde_json::from_str(json)?;
        Self::from_envelope(action, envelope)
    }

    /// Decode a replayed record that names its own `action`.
    pub fn from_undelivered(json: &str) -> Result<Self, TdError> {
        let mut envelope: Envelope = serde_json::from_str(json)?;
        let action = envelope.action.take().unwrap_or_default();
        Self::from_envelope(&action, envelope)
    }

    fn from_envelope(action: &str, envelope: Envelope) -> Result<Self, TdError> {
        let id = || {
            envelope
                .drawing_id
                .as_deref()
                .map(DrawingId::intern)
                .ok_or(TdError::MissingField { kind: "sync", field: "drawing_id" })
        };
        let data = || {
            envelope
                .drawing_data
                .clone()
                .ok_or(TdError::MissingField { kind: "sync", field: "drawing_data" })
        };
        Ok(match action {
            "create" => SyncMessage::Create {
                drawing: data()?,
                symbol: envelope.symbol.clone(),
            },
            "update" => SyncMessage::Update {
                id: id()?,
                drawing: data()?,
                symbol: envelope.symbol.clone(),
            },
            "delete" => SyncMessage::Delete {
                id: id()?,
                symbol: envelope.symbol.clone(),
            },
            other => return Err(TdError::UnknownEvent(other.to_string())),
        })
    }

    pub fn symbol(&self) -> &str {
        match self {
            SyncMessage::Create { symbol, .. }
            | SyncMessage::Update { symbol, .. }
            | SyncMessage::Delete { symbol, .. } => symbol,
        }
    }
}

/// Side of a position payload, if it is one.
pub fn position_side(kind: &str) -> Option<Side> {
    match DrawingKind::from_name(kind).ok()? {
        DrawingKind::Position(side) => Some(side),
        _ => None,
    }
}
