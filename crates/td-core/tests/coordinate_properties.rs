//! Integration tests: time ↔ logical index ↔ pixel resolution.
//!
//! Sweeps resolution across series with uneven edge intervals and checks
//! that drawings survive series replacement.

use td_core::coords::{
    ChartViewport, LinearViewport, logical_index_from_time, refresh_index_cache, time_from_logical_index,
    to_pixel_x,
};
use td_core::{Bar, BarSeries, Drawing, DrawingId, DrawingKind, DrawingOptions, DrawingSnapshot, LogicalPoint};

const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Daily bars for the first `daily` entries, then hourly bars.
fn mixed_series(daily: usize, hourly: usize) -> BarSeries {
    let mut bars = Vec::new();
    let mut t = 1_700_000_000;
    for i in 0..daily + hourly {
        let p = 50.0 + i as f64;
        bars.push(Bar::ohlc(t, p, p + 1.0, p - 1.0, p));
        t += if i + 1 < daily { DAY } else { HOUR };
    }
    BarSeries::new(bars).unwrap()
}

fn hourly(start: i64, n: usize) -> BarSeries {
    let rows: Vec<_> = (0..n).map(|i| (i as f64, i as f64 + 1.0, i as f64 - 1.0, i as f64)).collect();
    BarSeries::from_ohlc(start, HOUR, &rows)
}

/// Deterministic offsets without pulling in a randomness crate.
fn offsets(count: usize, modulo: i64) -> impl Iterator<Item = i64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count).map(move |_| {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        ((state >> 33) as i64).rem_euclid(modulo)
    })
}

// ─── Round trips ─────────────────────────────────────────────────────────

#[test]
fn index_time_index_within_one_bar() {
    for series in [mixed_series(5, 40), hourly(0, 2), hourly(10_000, 120)] {
        let len = series.len() as f64;
        let mut idx = -50.0;
        while idx < len + 50.0 {
            let time = time_from_logical_index(&series, idx).expect("time for index");
            let back = logical_index_from_time(&series, time).expect("index for time");
            assert!(
                (back - idx).abs() < 1.0 + 1e-9,
                "index {idx} → {time} → {back} on {} bars",
                series.len()
            );
            idx += 0.37;
        }
    }
}

#[test]
fn in_range_times_never_resolve_to_a_later_bar() {
    let series = mixed_series(8, 60);
    let vp = LinearViewport::new(&series, 6.0, 20.0, 200.0, 0.0, 400.0);
    let first = series.first().unwrap().time;
    let span = series.last().unwrap().time - first;

    for off in offsets(500, span + 1) {
        let t = first + off;
        let expected = series.index_at_or_before(t).unwrap();
        let x = to_pixel_x(&LogicalPoint::new(t, 1.0), &vp, &series).unwrap();
        assert_eq!(
            x,
            vp.logical_to_pixel(expected as f64).unwrap(),
            "time {t} should land on bar {expected}"
        );
    }
}

#[test]
fn extrapolation_uses_the_interval_at_each_edge() {
    let series = mixed_series(5, 20);
    let first = series.first().unwrap().time;
    let last = series.last().unwrap().time;
    assert_eq!(logical_index_from_time(&series, first - 2 * DAY), Some(-2.0));
    assert_eq!(
        logical_index_from_time(&series, last + 3 * HOUR),
        Some((series.len() - 1) as f64 + 3.0)
    );
}

// ─── Series replacement ──────────────────────────────────────────────────

#[test]
fn drawing_follows_its_time_after_older_bars_are_prepended() {
    let recent = hourly(100 * HOUR, 50);
    let mut drawing = Drawing::new(
        DrawingId::intern("prepend-line"),
        DrawingKind::Line,
        [LogicalPoint::new(110 * HOUR, 5.0), LogicalPoint::new(170 * HOUR, 9.0)],
        DrawingOptions::default(),
        &recent,
    )
    .unwrap();
    let vp = LinearViewport::new(&recent, 10.0, 0.0, 20.0, 0.0, 200.0);
    assert_eq!(refresh_index_cache(&mut drawing, &vp, &recent), 2);
    assert_eq!(drawing.points()[1].logical_index, Some(70.0));

    // Pagination loads 100 older bars; the series is replaced wholesale.
    let full = hourly(0, 150);
    drawing.invalidate_coordinate_cache();
    drawing.recompute_derived_geometry(&full);
    let vp = LinearViewport::new(&full, 10.0, 0.0, 20.0, 0.0, 200.0);

    let x0 = to_pixel_x(&drawing.points()[0], &vp, &full).unwrap();
    let x1 = to_pixel_x(&drawing.points()[1], &vp, &full).unwrap();
    assert_eq!(x0, 1100.0);
    assert_eq!(x1, 1700.0);
}

#[test]
fn snapshot_survives_a_timeframe_switch() {
    let hourly_series = hourly(0, 48);
    let drawing = Drawing::new(
        DrawingId::intern("tf-box"),
        DrawingKind::Box,
        [LogicalPoint::new(2 * HOUR, 10.0), LogicalPoint::at_index(60.0, 20.0)],
        DrawingOptions::default(),
        &hourly_series,
    )
    .unwrap();
    let json = drawing.snapshot(&hourly_series).unwrap().to_json().unwrap();

    let four_hourly = BarSeries::from_ohlc(0, 4 * HOUR, &[(1.0, 2.0, 0.0, 1.0); 12]);
    let restored = DrawingSnapshot::from_json(&json).unwrap().hydrate(&four_hourly).unwrap();
    assert_eq!(restored.points()[1].time, Some(60 * HOUR));
    assert_eq!(restored.points()[1].resolved_index(&four_hourly), Some(15.0));
}
