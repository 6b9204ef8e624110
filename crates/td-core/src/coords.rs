//! Coordinate resolution: time ↔ logical bar index ↔ pixel.
//!
//! The host chart only knows how to place times that exist in its loaded
//! series. Drawings routinely reference times outside that window (older
//! pages not yet loaded, projections into the future), so this module
//! derives a logical index from the bar series itself and extrapolates past
//! either edge using the interval *at that edge*. A series with fewer than
//! two bars has no interval and defers resolution.

use crate::model::{BarSeries, Drawing, LogicalPoint, UnixTime};
use kurbo::Point;
use smallvec::SmallVec;

// ─── Host interface ──────────────────────────────────────────────────────

/// The six conversions the host chart exposes. Each may fail (`None`), e.g.
/// a time with no bar in the loaded series, or a chart that hasn't laid out
/// yet.
pub trait ChartViewport {
    fn time_to_pixel(&self, time: UnixTime) -> Option<f64>;
    fn pixel_to_time(&self, x: f64) -> Option<UnixTime>;
    fn logical_to_pixel(&self, logical: f64) -> Option<f64>;
    fn pixel_to_logical(&self, x: f64) -> Option<f64>;
    fn price_to_pixel(&self, price: f64) -> Option<f64>;
    fn pixel_to_price(&self, y: f64) -> Option<f64>;
}

/// A headless viewport with a linear time and price scale.
///
/// Mirrors how a typical chart library behaves: logical positions map
/// anywhere, but times only resolve when a bar with that exact time is
/// loaded.
#[derive(Debug, Clone)]
pub struct LinearViewport {
    /// Pixel distance between adjacent bars.
    pub bar_spacing: f64,
    /// Pixel x of logical index 0.
    pub origin_x: f64,
    /// Price at the top edge (y = 0).
    pub price_top: f64,
    /// Price at the bottom edge (y = `height`).
    pub price_bottom: f64,
    pub height: f64,
    times: Vec<UnixTime>,
}

impl LinearViewport {
    pub fn new(
        series: &BarSeries,
        bar_spacing: f64,
        origin_x: f64,
        price_top: f64,
        price_bottom: f64,
        height: f64,
    ) -> Self {
        Self {
            bar_spacing: bar_spacing.max(0.01),
            origin_x,
            price_top,
            price_bottom,
            height,
            times: series.bars().iter().map(|b| b.time).collect(),
        }
    }

    /// Re-bind to a replaced series, keeping scale settings.
    pub fn rebind(&mut self, series: &BarSeries) {
        self.times = series.bars().iter().map(|b| b.time).collect();
    }

    /// Scroll horizontally by `dx` pixels.
    pub fn pan_px(&mut self, dx: f64) {
        self.origin_x += dx;
    }

    /// Zoom around a pixel x, keeping the logical position under it fixed.
    pub fn zoom_at(&mut self, cursor_x: f64, factor: f64) {
        let logical = (cursor_x - self.origin_x) / self.bar_spacing;
        self.bar_spacing = (self.bar_spacing * factor).clamp(0.5, 200.0);
        self.origin_x = cursor_x - logical * self.bar_spacing;
    }
}

impl ChartViewport for LinearViewport {
    fn time_to_pixel(&self, time: UnixTime) -> Option<f64> {
        let idx = self.times.binary_search(&time).ok()?;
        self.logical_to_pixel(idx as f64)
    }

    fn pixel_to_time(&self, x: f64) -> Option<UnixTime> {
        let logical = self.pixel_to_logical(x)?.round();
        if logical < 0.0 {
            return None;
        }
        self.times.get(logical as usize).copied()
    }

    fn logical_to_pixel(&self, logical: f64) -> Option<f64> {
        logical
            .is_finite()
            .then(|| self.origin_x + logical * self.bar_spacing)
    }

    fn pixel_to_logical(&self, x: f64) -> Option<f64> {
        x.is_finite()
            .then(|| (x - self.origin_x) / self.bar_spacing)
    }

    fn price_to_pixel(&self, price: f64) -> Option<f64> {
        let span = self.price_top - self.price_bottom;
        if span.abs() < 1e-12 || !price.is_finite() {
            return None;
        }
        Some((self.price_top - price) / span * self.height)
    }

    fn pixel_to_price(&self, y: f64) -> Option<f64> {
        if self.height <= 0.0 || !y.is_finite() {
            return None;
        }
        Some(self.price_top - y / self.height * (self.price_top - self.price_bottom))
    }
}

// ─── Time ↔ logical index ────────────────────────────────────────────────

/// Derive a logical index for `time` from the series.
///
/// Exact matches and in-range times map to the bar at or before `time`.
/// Times before the first or after the last bar extrapolate linearly using
/// the interval between the two bars at that edge.
pub fn logical_index_from_time(series: &BarSeries, time: UnixTime) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?;
    let last = series.last()?;

    if time < first.time {
        let interval = series.leading_interval().filter(|iv| *iv > 0)?;
        return Some((time - first.time) as f64 / interval as f64);
    }
    if time > last.time {
        let interval = series.trailing_interval().filter(|iv| *iv > 0)?;
        let last_index = (series.len() - 1) as f64;
        return Some(last_index + (time - last.time) as f64 / interval as f64);
    }
    series.index_at_or_before(time).map(|i| i as f64)
}

/// Inverse of [`logical_index_from_time`]: in-range indices floor to a bar,
/// out-of-range indices extrapolate with the local edge interval.
pub fn time_from_logical_index(series: &BarSeries, index: f64) -> Option<UnixTime> {
    if series.len() < 2 || !index.is_finite() {
        return None;
    }
    let first = series.first()?;
    let last = series.last()?;
    let last_index = (series.len() - 1) as f64;

    if index < 0.0 {
        let interval = series.leading_interval()? as f64;
        return Some(first.time + (index * interval).round() as i64);
    }
    if index > last_index {
        let interval = series.trailing_interval()? as f64;
        return Some(last.time + ((index - last_index) * interval).round() as i64);
    }
    series.get(index.floor() as usize).map(|b| b.time)
}

// ─── Point → pixel ───────────────────────────────────────────────────────

/// Resolve the horizontal pixel of a point.
///
/// 1. time → pixel through the viewport;
/// 2. cached logical index → pixel through the viewport;
/// 3. logical index derived from time against the series → pixel.
///
/// Returns `None` only when none of these work.
pub fn to_pixel_x(point: &LogicalPoint, viewport: &dyn ChartViewport, series: &BarSeries) -> Option<f64> {
    resolve_x(point, viewport, series).map(|(x, _)| x)
}

/// Like [`to_pixel_x`], but stores a derived logical index on the point so
/// the next resolution skips the series lookup.
pub fn to_pixel_x_cached(
    point: &mut LogicalPoint,
    viewport: &dyn ChartViewport,
    series: &BarSeries,
) -> Option<f64> {
    let (x, derived) = resolve_x(point, viewport, series)?;
    if let Some(idx) = derived {
        point.logical_index = Some(idx);
    }
    Some(x)
}

fn resolve_x(
    point: &LogicalPoint,
    viewport: &dyn ChartViewport,
    series: &BarSeries,
) -> Option<(f64, Option<f64>)> {
    if let Some(x) = point.time.and_then(|t| viewport.time_to_pixel(t)) {
        return Some((x, None));
    }
    if let Some(x) = point.logical_index.and_then(|i| viewport.logical_to_pixel(i)) {
        return Some((x, None));
    }
    let Some(idx) = point.time.and_then(|t| logical_index_from_time(series, t)) else {
        log::trace!("unresolvable point {point:?} against {} bars", series.len());
        return None;
    };
    viewport.logical_to_pixel(idx).map(|x| (x, Some(idx)))
}

/// Resolve both axes of a point to screen space.
pub fn to_screen(point: &LogicalPoint, viewport: &dyn ChartViewport, series: &BarSeries) -> Option<Point> {
    let x = to_pixel_x(point, viewport, series)?;
    let y = viewport.price_to_pixel(point.price)?;
    Some(Point::new(x, y))
}

/// Screen positions for every control point of a drawing, in point order.
/// Unresolvable points come back as `None`.
pub fn project(drawing: &Drawing, viewport: &dyn ChartViewport, series: &BarSeries) -> SmallVec<[Option<Point>; 3]> {
    drawing
        .points()
        .iter()
        .map(|p| to_screen(p, viewport, series))
        .collect()
}

/// Resolve every point of a drawing, caching derived logical indices.
/// Returns how many points resolved.
pub fn refresh_index_cache(drawing: &mut Drawing, viewport: &dyn ChartViewport, series: &BarSeries) -> usize {
    drawing
        .points_mut()
        .iter_mut()
        .filter_map(|p| to_pixel_x_cached(p, viewport, series))
        .count()
}

// ─── Pixel → point ───────────────────────────────────────────────────────

/// Build a logical point from a screen position.
///
/// The logical index is rounded to the nearest bar; time comes from the
/// viewport when a bar is loaded there, otherwise from extrapolation.
/// `known_time` lets the host pass a time it already resolved (e.g. from a
/// crosshair event).
pub fn point_from_pixel(
    x: f64,
    y: f64,
    known_time: Option<UnixTime>,
    viewport: &dyn ChartViewport,
    series: &BarSeries,
) -> Option<LogicalPoint> {
    let price = viewport.pixel_to_price(y).filter(|p| p.is_finite())?;
    let logical = viewport.pixel_to_logical(x).map(f64::round);
    let time = known_time
        .or_else(|| viewport.pixel_to_time(x))
        .or_else(|| logical.and_then(|l| time_from_logical_index(series, l)));
    if time.is_none() && logical.is_none() {
        log::trace!("pixel ({x}, {y}) has no horizontal coordinate");
        return None;
    }
    Some(LogicalPoint {
        time,
        price,
        logical_index: logical,
    })
}
