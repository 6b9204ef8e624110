//! Derived geometry for each drawing kind.
//!
//! Geometry lives in chart space (time / logical index / price), never in
//! pixels, so it survives pan and zoom unchanged. It is a pure function of
//! the control points and the bar series: `Drawing` recomputes it after
//! every point mutation and on series replacement.

use crate::model::{BarSeries, DrawingKind, LogicalPoint, Side, UnixTime};
use smallvec::SmallVec;

/// Standard retracement ratios. Level 0 sits at the end point, level 1 at
/// the start point.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    #[default]
    None,
    Line(SegmentGeometry),
    Box(Bounds),
    Fib(FibGeometry),
    Ruler(RulerMeasure),
    Position(PositionGeometry),
}

/// Axis-aligned extent of two points in chart space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub time_start: Option<UnixTime>,
    pub time_end: Option<UnixTime>,
    pub index_start: Option<f64>,
    pub index_end: Option<f64>,
    pub price_low: f64,
    pub price_high: f64,
}

impl Bounds {
    pub fn of(a: &LogicalPoint, b: &LogicalPoint, series: &BarSeries) -> Self {
        let (time_start, time_end) = min_max(a.resolved_time(series), b.resolved_time(series));
        let (index_start, index_end) = min_max(a.resolved_index(series), b.resolved_index(series));
        Self {
            time_start,
            time_end,
            index_start,
            index_end,
            price_low: a.price.min(b.price),
            price_high: a.price.max(b.price),
        }
    }

    pub fn contains_price(&self, price: f64) -> bool {
        self.price_low <= price && price <= self.price_high
    }
}

fn min_max<T: PartialOrd + Copy>(a: Option<T>, b: Option<T>) -> (Option<T>, Option<T>) {
    match (a, b) {
        (Some(a), Some(b)) if b < a => (Some(b), Some(a)),
        (Some(a), Some(b)) => (Some(a), Some(b)),
        _ => (a, b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentGeometry {
    pub bounds: Bounds,
    /// Price change per bar, when both ends resolve to an index.
    pub slope_per_bar: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FibGeometry {
    pub bounds: Bounds,
    pub levels: SmallVec<[FibLevel; 7]>,
}

/// Measurement between a ruler's start and end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulerMeasure {
    pub price_delta: f64,
    /// `None` when the start price is zero.
    pub percent_change: Option<f64>,
    /// Signed bar distance, rounded to whole bars.
    pub bar_count: Option<i64>,
    /// Signed wall-clock span in seconds.
    pub time_span: Option<i64>,
}

impl RulerMeasure {
    pub fn bar_count_label(&self) -> String {
        self.bar_count.map(|n| n.to_string()).unwrap_or_default()
    }

    pub fn price_label(&self) -> String {
        match self.percent_change {
            Some(pct) => format!("{:+.2} ({:+.2}%)", self.price_delta, pct),
            None => format!("{:+.2}", self.price_delta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
}

impl PriceRange {
    fn between(a: f64, b: f64) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }
}

/// How the position played out against the loaded bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOutcome {
    /// No bar in the window touched the entry price.
    NotFilled,
    /// Filled, but neither stop nor target touched yet.
    Open,
    TargetHit,
    StopHit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub time: UnixTime,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionGeometry {
    pub side: Side,
    pub entry: f64,
    pub target: f64,
    pub stop: f64,
    pub time_start: Option<UnixTime>,
    pub time_end: Option<UnixTime>,
    pub profit_zone: PriceRange,
    pub loss_zone: PriceRange,
    /// Reward over risk; `None` when the stop sits on the entry.
    pub risk_reward: Option<f64>,
    pub outcome: PositionOutcome,
    /// Entry → fill → exit polyline for the realized-outcome overlay.
    pub path: SmallVec<[PathPoint; 3]>,
}

impl Geometry {
    pub fn compute(kind: DrawingKind, points: &[LogicalPoint], series: &BarSeries) -> Self {
        match (kind, points) {
            (DrawingKind::Line, [a, b]) => Geometry::Line(segment(a, b, series)),
            (DrawingKind::Box, [a, b]) => Geometry::Box(Bounds::of(a, b, series)),
            (DrawingKind::FibRetracement, [a, b]) => Geometry::Fib(fib(a, b, series)),
            (DrawingKind::Ruler, [a, b]) => Geometry::Ruler(ruler(a, b, series)),
            (DrawingKind::Position(side), [entry, target, stop]) => {
                Geometry::Position(position(side, entry, target, stop, series))
            }
            _ => Geometry::None,
        }
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        match self {
            Geometry::Line(s) => Some(&s.bounds),
            Geometry::Box(b) => Some(b),
            Geometry::Fib(f) => Some(&f.bounds),
            _ => None,
        }
    }
}

fn segment(a: &LogicalPoint, b: &LogicalPoint, series: &BarSeries) -> SegmentGeometry {
    let slope_per_bar = match (a.resolved_index(series), b.resolved_index(series)) {
        (Some(ia), Some(ib)) if (ib - ia).abs() > f64::EPSILON => Some((b.price - a.price) / (ib - ia)),
        _ => None,
    };
    SegmentGeometry {
        bounds: Bounds::of(a, b, series),
        slope_per_bar,
    }
}

fn fib(start: &LogicalPoint, end: &LogicalPoint, series: &BarSeries) -> FibGeometry {
    let range = start.price - end.price;
    FibGeometry {
        bounds: Bounds::of(start, end, series),
        levels: FIB_RATIOS
            .iter()
            .map(|&ratio| FibLevel {
                ratio,
                price: end.price + range * ratio,
            })
            .collect(),
    }
}

fn ruler(start: &LogicalPoint, end: &LogicalPoint, series: &BarSeries) -> RulerMeasure {
    let price_delta = end.price - start.price;
    let percent_change = (start.price.abs() > f64::EPSILON).then(|| price_delta / start.price * 100.0);
    let bar_count = match (start.resolved_index(series), end.resolved_index(series)) {
        (Some(a), Some(b)) => Some((b - a).round() as i64),
        _ => None,
    };
    let time_span = match (start.resolved_time(series), end.resolved_time(series)) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    };
    RulerMeasure {
        price_delta,
        percent_change,
        bar_count,
        time_span,
    }
}

fn position(
    side: Side,
    entry: &LogicalPoint,
    target: &LogicalPoint,
    stop: &LogicalPoint,
    series: &BarSeries,
) -> PositionGeometry {
    let risk = (entry.price - stop.price).abs();
    let reward = (target.price - entry.price).abs();
    let time_start = entry.resolved_time(series);
    let time_end = target.resolved_time(series).filter(|end| time_start.is_none_or(|s| *end > s));
    let (outcome, path) = match time_start {
        Some(start) => realized_outcome(series, start, entry.price, target.price, stop.price),
        None => (PositionOutcome::NotFilled, SmallVec::new()),
    };

    PositionGeometry {
        side,
        entry: entry.price,
        target: target.price,
        stop: stop.price,
        time_start,
        time_end,
        profit_zone: PriceRange::between(entry.price, target.price),
        loss_zone: PriceRange::between(entry.price, stop.price),
        risk_reward: (risk > f64::EPSILON).then(|| reward / risk),
        outcome,
        path,
    }
}

/// Walk every loaded bar from `start` on, past the box's right edge: find the
/// first bar touching the entry, then the first later bar touching stop or
/// target. A bar touching both is scored as a stop. When the data doesn't
/// decide, the path ends at the last available bar.
fn realized_outcome(
    series: &BarSeries,
    start: UnixTime,
    entry: f64,
    target: f64,
    stop: f64,
) -> (PositionOutcome, SmallVec<[PathPoint; 3]>) {
    let window: SmallVec<[usize; 64]> = series
        .bars()
        .iter()
        .enumerate()
        .filter(|(_, b)| !b.is_placeholder() && b.time >= start)
        .map(|(i, _)| i)
        .collect();

    let mut path: SmallVec<[PathPoint; 3]> = SmallVec::new();
    let Some(&last_idx) = window.last() else {
        return (PositionOutcome::NotFilled, path);
    };
    let bars = series.bars();
    path.push(PathPoint { time: start, price: entry });

    let Some(fill_pos) = window.iter().position(|&i| bars[i].touches(entry)) else {
        path.push(PathPoint {
            time: bars[last_idx].time,
            price: entry,
        });
        return (PositionOutcome::NotFilled, path);
    };
    let fill = &bars[window[fill_pos]];
    path.push(PathPoint {
        time: fill.time,
        price: entry,
    });

    for &i in &window[fill_pos + 1..] {
        let b = &bars[i];
        if b.touches(stop) {
            path.push(PathPoint { time: b.time, price: stop });
            return (PositionOutcome::StopHit, path);
        }
        if b.touches(target) {
            path.push(PathPoint {
                time: b.time,
                price: target,
            });
            return (PositionOutcome::TargetHit, path);
        }
    }

    let last = &bars[last_idx];
    path.push(PathPoint {
        time: last.time,
        price: last.close.unwrap_or(entry),
    });
    (PositionOutcome::Open, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;
    use pretty_assertions::assert_eq;

    const HOUR: i64 = 3600;

    fn flat(n: usize, price: f64) -> BarSeries {
        let rows: Vec<_> = (0..n).map(|_| (price, price + 1.0, price - 1.0, price)).collect();
        BarSeries::from_ohlc(0, HOUR, &rows)
    }

    #[test]
    fn box_bounds_normalize_order() {
        let s = flat(30, 100.0);
        let g = Geometry::compute(
            DrawingKind::Box,
            &[LogicalPoint::new(20 * HOUR, 100.0), LogicalPoint::new(10 * HOUR, 110.0)],
            &s,
        );
        let Geometry::Box(b) = g else { panic!("expected box") };
        assert_eq!(b.time_start, Some(10 * HOUR));
        assert_eq!(b.time_end, Some(20 * HOUR));
        assert_eq!(b.price_low, 100.0);
        assert_eq!(b.price_high, 110.0);
        assert!(b.contains_price(105.0));
    }

    #[test]
    fn fib_levels_span_end_to_start() {
        let s = flat(10, 100.0);
        let g = Geometry::compute(
            DrawingKind::FibRetracement,
            &[LogicalPoint::new(0, 200.0), LogicalPoint::new(5 * HOUR, 100.0)],
            &s,
        );
        let Geometry::Fib(f) = g else { panic!("expected fib") };
        let prices: Vec<f64> = f.levels.iter().map(|l| (l.price * 1000.0).round() / 1000.0).collect();
        assert_eq!(prices, vec![100.0, 123.6, 138.2, 150.0, 161.8, 178.6, 200.0]);
    }

    #[test]
    fn ruler_counts_bars_beyond_data() {
        let s = flat(50, 100.0);
        let g = Geometry::compute(
            DrawingKind::Ruler,
            &[LogicalPoint::new(50 * HOUR, 100.0), LogicalPoint::at_index(60.0, 110.0)],
            &s,
        );
        let Geometry::Ruler(r) = g else { panic!("expected ruler") };
        assert_eq!(r.bar_count_label(), "10");
        assert_eq!(r.time_span, Some(10 * HOUR));
        assert_eq!(r.price_label(), "+10.00 (+10.00%)");
    }

    #[test]
    fn recompute_is_idempotent() {
        let s = flat(40, 100.0);
        let pts = [
            LogicalPoint::new(2 * HOUR, 100.0),
            LogicalPoint::new(30 * HOUR, 104.0),
            LogicalPoint::new(2 * HOUR, 98.0),
        ];
        let kind = DrawingKind::Position(Side::Long);
        assert_eq!(Geometry::compute(kind, &pts, &s), Geometry::compute(kind, &pts, &s));
    }

    fn series_with(bars: &[(f64, f64)]) -> BarSeries {
        // (low, high) per bar; open/close at the midpoint
        let bars = bars
            .iter()
            .enumerate()
            .map(|(i, &(lo, hi))| Bar::ohlc(i as i64 * HOUR, (lo + hi) / 2.0, hi, lo, (lo + hi) / 2.0))
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn long(series: &BarSeries, entry: f64, target: f64, stop: f64) -> PositionGeometry {
        let pts = [
            LogicalPoint::new(HOUR, entry),
            LogicalPoint::new(100 * HOUR, target),
            LogicalPoint::new(HOUR, stop),
        ];
        match Geometry::compute(DrawingKind::Position(Side::Long), &pts, series) {
            Geometry::Position(p) => p,
            other => panic!("expected position, got {other:?}"),
        }
    }

    #[test]
    fn position_hits_target_after_fill() {
        let s = series_with(&[(90.0, 91.0), (95.0, 96.0), (99.0, 101.0), (101.0, 106.0), (108.0, 111.0)]);
        let p = long(&s, 100.0, 110.0, 95.0);
        assert_eq!(p.outcome, PositionOutcome::TargetHit);
        let times: Vec<i64> = p.path.iter().map(|pt| pt.time).collect();
        assert_eq!(times, vec![HOUR, 2 * HOUR, 4 * HOUR]);
        assert_eq!(p.path[2].price, 110.0);
        assert_eq!(p.risk_reward, Some(2.0));
    }

    #[test]
    fn position_scores_ambiguous_bar_as_stop() {
        let s = series_with(&[(0.0, 1.0), (99.0, 101.0), (90.0, 120.0)]);
        let p = long(&s, 100.0, 110.0, 95.0);
        assert_eq!(p.outcome, PositionOutcome::StopHit);
        assert_eq!(p.path.last().map(|pt| pt.price), Some(95.0));
    }

    #[test]
    fn position_open_falls_back_to_last_bar() {
        let s = series_with(&[(0.0, 1.0), (99.0, 101.0), (100.0, 102.0), (101.0, 103.0)]);
        let p = long(&s, 100.0, 110.0, 95.0);
        assert_eq!(p.outcome, PositionOutcome::Open);
        let last = p.path.last().unwrap();
        assert_eq!(last.time, 3 * HOUR);
        assert_eq!(last.price, 102.0);
    }

    #[test]
    fn position_not_filled_when_entry_untouched() {
        let s = series_with(&[(0.0, 1.0), (120.0, 121.0), (122.0, 125.0)]);
        let p = long(&s, 100.0, 110.0, 95.0);
        assert_eq!(p.outcome, PositionOutcome::NotFilled);
        assert_eq!(p.path.len(), 2);
    }

    #[test]
    fn position_stop_after_right_edge_still_counts() {
        // Right edge at bar 3; the stop is only touched at bar 6.
        let s = series_with(&[
            (0.0, 1.0),
            (99.0, 101.0),
            (100.0, 102.0),
            (100.0, 103.0),
            (100.0, 102.0),
            (99.0, 101.0),
            (90.0, 100.0),
        ]);
        let pts = [
            LogicalPoint::new(HOUR, 100.0),
            LogicalPoint::new(3 * HOUR, 110.0),
            LogicalPoint::new(HOUR, 95.0),
        ];
        let Geometry::Position(p) = Geometry::compute(DrawingKind::Position(Side::Long), &pts, &s) else {
            panic!("expected position");
        };
        assert_eq!(p.time_end, Some(3 * HOUR));
        assert_eq!(p.outcome, PositionOutcome::StopHit);
        assert_eq!(p.path.last().map(|pt| (pt.time, pt.price)), Some((6 * HOUR, 95.0)));
    }
}
