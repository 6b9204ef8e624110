//! Core data model for chart drawings.
//!
//! A chart carries a single [`BarSeries`] (read-only, replaced wholesale by
//! the data layer) and a flat list of [`Drawing`]s. Each drawing owns two or
//! three [`LogicalPoint`]s (hybrid coordinates that carry a wall-clock time,
//! a price, and a cached bar index) plus style options and derived
//! geometry that is recomputed after every point mutation.

use crate::coords;
use crate::error::TdError;
use crate::geometry::Geometry;
use crate::id::DrawingId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// Seconds since the Unix epoch (UTC), the host chart's time unit.
pub type UnixTime = i64;

// ─── Colors & Style ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RRGGBB`, `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let byte = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 1.0)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Parse any color the host or server sends: hex, or CSS
    /// `rgb(r, g, b)` / `rgba(r, g, b, a)` with 0–255 channels.
    pub fn from_css(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        let inner = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: SmallVec<[f32; 4]> = inner
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [r, g, b] => Some(Self::rgba(r / 255.0, g / 255.0, b / 255.0, 1.0)),
            [r, g, b, a] => Some(Self::rgba(r / 255.0, g / 255.0, b / 255.0, *a)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_css(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Style options for a drawing. Painting is the host's job; these are only
/// carried so a snapshot fully reconstructs what the user saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrawingOptions {
    pub line_color: Color,
    pub line_width: f32,
    pub line_style: LineStyle,
    /// Fill for boxes and zone backgrounds. `None` = unfilled.
    pub fill_color: Option<Color>,
    pub profit_color: Color,
    pub loss_color: Color,
    pub show_labels: bool,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            line_color: Color::rgba(0.16, 0.38, 1.0, 1.0),
            line_width: 2.0,
            line_style: LineStyle::Solid,
            fill_color: None,
            profit_color: Color::rgba(0.03, 0.6, 0.51, 0.2),
            loss_color: Color::rgba(0.95, 0.21, 0.27, 0.2),
            show_labels: true,
        }
    }
}

// ─── Bars ────────────────────────────────────────────────────────────────

/// One bar of the price series. Placeholder bars (future whitespace) carry a
/// time but no OHLC values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: UnixTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
}

impl Bar {
    pub fn ohlc(time: UnixTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    pub fn placeholder(time: UnixTime) -> Self {
        Self {
            time,
            open: None,
            high: None,
            low: None,
            close: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.open.is_none() && self.high.is_none() && self.low.is_none() && self.close.is_none()
    }

    /// The `[open, high, low, close]` values that are present.
    pub fn values(&self) -> SmallVec<[f64; 4]> {
        [self.open, self.high, self.low, self.close]
            .into_iter()
            .flatten()
            .collect()
    }

    /// True when `price` lies within the bar's low–high range.
    pub fn touches(&self, price: f64) -> bool {
        match (self.low, self.high) {
            (Some(lo), Some(hi)) => lo <= price && price <= hi,
            _ => false,
        }
    }
}

/// Ascending, immutable bar sequence. Replaced wholesale on reload,
/// pagination, or timeframe switch, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series; times must be strictly ascending.
    pub fn new(bars: Vec<Bar>) -> Result<Self, TdError> {
        if let Some(w) = bars.windows(2).find(|w| w[1].time <= w[0].time) {
            return Err(TdError::UnorderedBars {
                prev: w[0].time,
                next: w[1].time,
            });
        }
        Ok(Self { bars })
    }

    /// Evenly spaced bars from `(open, high, low, close)` tuples.
    pub fn from_ohlc(start: UnixTime, interval: i64, rows: &[(f64, f64, f64, f64)]) -> Self {
        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Bar::ohlc(start + i as i64 * interval, o, h, l, c))
            .collect();
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Interval between the first two bars.
    pub fn leading_interval(&self) -> Option<i64> {
        match self.bars.as_slice() {
            [a, b, ..] => Some(b.time - a.time),
            _ => None,
        }
    }

    /// Interval between the last two bars.
    pub fn trailing_interval(&self) -> Option<i64> {
        match self.bars.as_slice() {
            [.., a, b] => Some(b.time - a.time),
            _ => None,
        }
    }

    /// Index of the bar with exactly this time.
    pub fn index_of(&self, time: UnixTime) -> Option<usize> {
        self.bars.binary_search_by_key(&time, |b| b.time).ok()
    }

    /// Index of the last bar whose time is `<= time`.
    pub fn index_at_or_before(&self, time: UnixTime) -> Option<usize> {
        match self.bars.binary_search_by_key(&time, |b| b.time) {
            Ok(i) => Some(i),
            Err(0) => None,
            Err(i) => Some(i - 1),
        }
    }

    /// Index of the bar closest in time (ties resolve to the earlier bar).
    pub fn nearest_index(&self, time: UnixTime) -> Option<usize> {
        if self.bars.is_empty() {
            return None;
        }
        match self.bars.binary_search_by_key(&time, |b| b.time) {
            Ok(i) => Some(i),
            Err(0) => Some(0),
            Err(i) if i >= self.bars.len() => Some(self.bars.len() - 1),
            Err(i) => {
                let before = time - self.bars[i - 1].time;
                let after = self.bars[i].time - time;
                Some(if after < before { i } else { i - 1 })
            }
        }
    }

    /// Index of the last bar that carries real OHLC data.
    pub fn last_real_index(&self) -> Option<usize> {
        self.bars.iter().rposition(|b| !b.is_placeholder())
    }
}

// ─── Logical points ──────────────────────────────────────────────────────

/// A hybrid chart coordinate.
///
/// `time` is the persisted horizontal coordinate; `logical_index` is a cache
/// of the bar index for that time (possibly fractional or outside
/// `0..len` when extrapolated). Points placed beyond the loaded data may
/// start life with only a logical index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalPoint {
    pub time: Option<UnixTime>,
    pub price: f64,
    #[serde(default, skip_serializing)]
    pub logical_index: Option<f64>,
}

impl LogicalPoint {
    pub fn new(time: UnixTime, price: f64) -> Self {
        Self {
            time: Some(time),
            price,
            logical_index: None,
        }
    }

    /// A point known only by its bar index (e.g. placed beyond the data).
    pub fn at_index(logical_index: f64, price: f64) -> Self {
        Self {
            time: None,
            price,
            logical_index: Some(logical_index),
        }
    }

    pub fn with_index(mut self, logical_index: f64) -> Self {
        self.logical_index = Some(logical_index);
        self
    }

    /// Price is finite and at least one horizontal coordinate is present.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite()
            && (self.time.is_some() || self.logical_index.is_some_and(f64::is_finite))
    }

    /// Give an index-only point the time it has against `series`.
    pub fn pin_time(&mut self, series: &BarSeries) {
        if self.time.is_none() {
            self.time = self.resolved_time(series);
        }
    }

    /// Drop the cached bar index. The time survives.
    pub fn invalidate(&mut self) {
        if self.time.is_some() {
            self.logical_index = None;
        }
    }

    /// Time of this point, derived from the logical index when not stored.
    pub fn resolved_time(&self, series: &BarSeries) -> Option<UnixTime> {
        self.time.or_else(|| {
            self.logical_index
                .and_then(|idx| coords::time_from_logical_index(series, idx))
        })
    }

    /// Bar index of this point, derived from the time when not cached.
    pub fn resolved_index(&self, series: &BarSeries) -> Option<f64> {
        self.logical_index
            .or_else(|| self.time.and_then(|t| coords::logical_index_from_time(series, t)))
    }
}

// ─── Drawings ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

/// The annotation type. Determines point count, handle topology, and
/// derived geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingKind {
    Line,
    Box,
    FibRetracement,
    Ruler,
    Position(Side),
}

impl DrawingKind {
    pub fn point_count(self) -> usize {
        match self {
            DrawingKind::Position(_) => 3,
            _ => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawingKind::Line => "line",
            DrawingKind::Box => "box",
            DrawingKind::FibRetracement => "fib_retracement",
            DrawingKind::Ruler => "ruler",
            DrawingKind::Position(Side::Long) => "long_position",
            DrawingKind::Position(Side::Short) => "short_position",
        }
    }
}

/// Named control-point slots. Two-point shapes use `Start`/`End`;
/// positions use `Entry`/`Target`/`Stop`.
///
/// A position's `Target` time is its right edge; `Stop` time mirrors entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
    Entry,
    Target,
    Stop,
}

impl Anchor {
    pub fn index(self) -> usize {
        match self {
            Anchor::Start | Anchor::Entry => 0,
            Anchor::End | Anchor::Target => 1,
            Anchor::Stop => 2,
        }
    }
}

pub type Points = SmallVec<[LogicalPoint; 3]>;

/// A drawing on the chart: control points, style, UI flags, and derived
/// geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub id: DrawingId,
    pub kind: DrawingKind,
    points: Points,
    pub options: DrawingOptions,
    pub selected: bool,
    pub hovered: bool,
    /// Still being placed by a creation tool; not yet committed.
    pub is_preview: bool,
    geometry: Geometry,
}

impl Drawing {
    /// Build a drawing, checking point count and validity, and compute its
    /// geometry against `series`.
    pub fn new(
        id: DrawingId,
        kind: DrawingKind,
        points: impl IntoIterator<Item = LogicalPoint>,
        options: DrawingOptions,
        series: &BarSeries,
    ) -> Result<Self, TdError> {
        let points: Points = points.into_iter().collect();
        if points.len() != kind.point_count() {
            return Err(TdError::PointCount {
                kind: kind.name(),
                expected: kind.point_count(),
                found: points.len(),
            });
        }
        if let Some(i) = points.iter().position(|p| !p.is_valid()) {
            return Err(TdError::InvalidPoint { index: i });
        }
        let mut drawing = Self {
            id,
            kind,
            points,
            options,
            selected: false,
            hovered: false,
            is_preview: false,
            geometry: Geometry::None,
        };
        drawing.recompute_derived_geometry(series);
        Ok(drawing)
    }

    pub fn points(&self) -> &[LogicalPoint] {
        &self.points
    }

    pub fn point(&self, anchor: Anchor) -> Option<&LogicalPoint> {
        self.points.get(anchor.index())
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Write the given control points and recompute geometry. Anchors that
    /// don't exist for this kind and non-finite prices are ignored.
    pub fn apply_delta(&mut self, updates: &[(Anchor, LogicalPoint)], series: &BarSeries) {
        for &(anchor, point) in updates {
            if !point.is_valid() {
                log::debug!("{}: ignoring invalid point for {anchor:?}", self.id);
                continue;
            }
            if let Some(slot) = self.points.get_mut(anchor.index()) {
                *slot = point;
            }
        }
        self.recompute_derived_geometry(series);
    }

    /// Replace all control points at once (used when restoring a gesture
    /// origin or translating the whole shape).
    pub fn set_points(&mut self, points: &[LogicalPoint], series: &BarSeries) {
        if points.len() == self.points.len() && points.iter().all(LogicalPoint::is_valid) {
            self.points = points.iter().copied().collect();
            self.recompute_derived_geometry(series);
        }
    }

    pub fn recompute_derived_geometry(&mut self, series: &BarSeries) {
        self.geometry = Geometry::compute(self.kind, &self.points, series);
    }

    /// Clear cached logical indices so they are re-derived against the
    /// next series. Points that only have an index keep it.
    pub fn invalidate_coordinate_cache(&mut self) {
        for p in &mut self.points {
            p.invalidate();
        }
    }

    /// Fill in missing times from logical indices, so the drawing stays put
    /// after the series it was placed against goes away.
    pub fn pin_times(&mut self, series: &BarSeries) {
        for p in &mut self.points {
            p.pin_time(series);
        }
    }

    /// Mutable access for coordinate caching during projection.
    pub(crate) fn points_mut(&mut self) -> &mut Points {
        &mut self.points
    }
}
