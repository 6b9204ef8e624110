//! Hit testing: pixel → drawing / handle lookup.
//!
//! The predicates work in screen space and take control points as
//! `Option<Point>`; an unresolved input is simply a miss. [`hit_test`]
//! walks drawings front-to-back (last drawn = topmost).

use crate::handles::{Handle, HandleShape, find_handle, handles_for};
use crate::project::{Projected, ScreenShape, project_drawing};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use td_core::coords::ChartViewport;
use td_core::{BarSeries, Drawing, DrawingId, DrawingKind};

/// Pixel tolerances for hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HitConfig {
    /// Radius of circular handles.
    pub handle_radius: f64,
    /// Half the side of square handles.
    pub handle_half_side: f64,
    /// Distance from a segment that still counts as on it.
    pub segment_tolerance: f64,
    /// Corner/edge tolerance as a fraction of the box size.
    pub corner_pct: f64,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            handle_radius: 6.0,
            handle_half_side: 5.0,
            segment_tolerance: 5.0,
            corner_pct: 0.1,
        }
    }
}

// ─── Predicates ──────────────────────────────────────────────────────────

/// Inclusive containment in the box spanned by `a` and `b`.
pub fn point_in_box(p: Point, a: Option<Point>, b: Option<Point>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    let r = Rect::from_points(a, b);
    (r.x0..=r.x1).contains(&p.x) && (r.y0..=r.y1).contains(&p.y)
}

/// True when `p` is within `tolerance` of the segment `a`–`b`, using the
/// projection clamped to the segment.
pub fn point_near_segment(p: Point, a: Option<Point>, b: Option<Point>, tolerance: f64) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < 1e-9 {
        return p.distance(a) <= tolerance;
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    p.distance(a + seg * t) <= tolerance
}

pub fn point_in_circle(p: Point, center: Option<Point>, radius: f64) -> bool {
    center.is_some_and(|c| p.distance(c) <= radius)
}

pub fn point_in_square(p: Point, center: Option<Point>, half_side: f64) -> bool {
    center.is_some_and(|c| (p.x - c.x).abs() <= half_side && (p.y - c.y).abs() <= half_side)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxZone {
    Corner(Corner),
    Edge(Edge),
    Inside,
}

/// Where `p` falls on the box spanned by `a` and `b`, with edge tolerance
/// `pct` of the box width (horizontally) and height (vertically).
///
/// Corners win over edges. A point within tolerance of two opposite edges
/// (a thin box) counts as inside on that axis. `None` when outside the
/// tolerance band entirely.
pub fn classify_box(p: Point, a: Option<Point>, b: Option<Point>, pct: f64) -> Option<BoxZone> {
    let (Some(a), Some(b)) = (a, b) else {
        return None;
    };
    let r = Rect::from_points(a, b);
    let (tol_x, tol_y) = (r.width() * pct, r.height() * pct);
    let band = r.inflate(tol_x, tol_y);
    if !((band.x0..=band.x1).contains(&p.x) && (band.y0..=band.y1).contains(&p.y)) {
        return None;
    }

    let x_edge = match ((p.x - r.x0).abs() <= tol_x, (p.x - r.x1).abs() <= tol_x) {
        (true, false) => Some(Edge::Left),
        (false, true) => Some(Edge::Right),
        _ => None,
    };
    let y_edge = match ((p.y - r.y0).abs() <= tol_y, (p.y - r.y1).abs() <= tol_y) {
        (true, false) => Some(Edge::Top),
        (false, true) => Some(Edge::Bottom),
        _ => None,
    };

    Some(match (x_edge, y_edge) {
        (Some(Edge::Left), Some(Edge::Top)) => BoxZone::Corner(Corner::TopLeft),
        (Some(Edge::Right), Some(Edge::Top)) => BoxZone::Corner(Corner::TopRight),
        (Some(Edge::Left), Some(_)) => BoxZone::Corner(Corner::BottomLeft),
        (Some(_), Some(_)) => BoxZone::Corner(Corner::BottomRight),
        (Some(e), None) | (None, Some(e)) => BoxZone::Edge(e),
        (None, None) => BoxZone::Inside,
    })
}

pub fn nearest_corner(p: Point, a: Option<Point>, b: Option<Point>, pct: f64) -> Option<Corner> {
    match classify_box(p, a, b, pct)? {
        BoxZone::Corner(c) => Some(c),
        _ => None,
    }
}

/// The edge whose midpoint `p` is near: on the edge band and within `pct`
/// of the edge length from its middle.
pub fn nearest_midpoint(p: Point, a: Option<Point>, b: Option<Point>, pct: f64) -> Option<Edge> {
    let BoxZone::Edge(edge) = classify_box(p, a, b, pct)? else {
        return None;
    };
    let r = Rect::from_points(a?, b?);
    let c = r.center();
    let near_middle = match edge {
        Edge::Top | Edge::Bottom => (p.x - c.x).abs() <= r.width() * pct,
        Edge::Left | Edge::Right => (p.y - c.y).abs() <= r.height() * pct,
    };
    near_middle.then_some(edge)
}

// ─── Drawing-level hit test ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    Handle(Handle),
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub id: DrawingId,
    pub target: HitTarget,
}

impl Hit {
    pub fn handle(&self) -> Option<&Handle> {
        match &self.target {
            HitTarget::Handle(h) => Some(h),
            HitTarget::Body => None,
        }
    }
}

/// Find the topmost drawing under `point`.
///
/// Handles are only live on hovered or selected drawings and are tested
/// before any body, so a selected drawing's handle stays grabbable under
/// another drawing's body. Preview drawings are ignored.
pub fn hit_test(
    drawings: &[Drawing],
    viewport: &dyn ChartViewport,
    series: &BarSeries,
    point: Point,
    config: &HitConfig,
) -> Option<Hit> {
    let projected: Vec<(&Drawing, Projected)> = drawings
        .iter()
        .filter(|d| !d.is_preview)
        .map(|d| (d, project_drawing(d, viewport, series)))
        .collect();

    for (drawing, proj) in projected.iter().rev() {
        if (drawing.hovered || drawing.selected)
            && let Some(handle) = handle_at(proj, point, config)
        {
            return Some(Hit {
                id: drawing.id,
                target: HitTarget::Handle(handle),
            });
        }
    }

    projected
        .iter()
        .rev()
        .find(|(_, proj)| body_contains(proj, point, config))
        .map(|(drawing, _)| Hit {
            id: drawing.id,
            target: HitTarget::Body,
        })
}

/// The handle of `proj` under `point`. On boxes the percentage corner and
/// midpoint zones count as well as the handle shapes.
pub fn handle_at(proj: &Projected, point: Point, config: &HitConfig) -> Option<Handle> {
    let handles = handles_for(proj);
    let direct = handles.iter().find(|h| match h.shape {
        HandleShape::Circle => point_in_circle(point, Some(h.position), config.handle_radius),
        HandleShape::Square => point_in_square(point, Some(h.position), config.handle_half_side),
    });
    if let Some(h) = direct {
        return Some(*h);
    }
    if proj.kind != DrawingKind::Box {
        return None;
    }
    let (a, b) = (proj.point(0), proj.point(1));
    if let Some(corner) = nearest_corner(point, a, b, config.corner_pct) {
        return find_handle(&handles, corner.into());
    }
    nearest_midpoint(point, a, b, config.corner_pct).and_then(|edge| find_handle(&handles, edge.into()))
}

pub fn body_contains(proj: &Projected, point: Point, config: &HitConfig) -> bool {
    let tol = config.segment_tolerance;
    let in_rect = |r: &Rect| point_in_box(point, Some(r.origin()), Some(Point::new(r.x1, r.y1)));
    match &proj.shape {
        None => false,
        Some(ScreenShape::Segment(line)) => point_near_segment(point, Some(line.p0), Some(line.p1), tol),
        Some(ScreenShape::Rect(r)) => in_rect(&r.inflate(tol, tol)),
        Some(ScreenShape::Fib { rect, levels }) => {
            in_rect(rect) || levels.iter().any(|l| point_near_segment(point, Some(l.p0), Some(l.p1), tol))
        }
        Some(ScreenShape::Position { entry, profit, loss }) => {
            in_rect(profit)
                || in_rect(loss)
                || point_near_segment(point, Some(entry.p0), Some(entry.p1), tol)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::HandleName;
    use pretty_assertions::assert_eq;
    use td_core::{DrawingOptions, LinearViewport, LogicalPoint};

    const HOUR: i64 = 3600;

    fn pt(x: f64, y: f64) -> Option<Point> {
        Some(Point::new(x, y))
    }

    #[test]
    fn segment_uses_clamped_projection() {
        let (a, b) = (pt(0.0, 0.0), pt(100.0, 0.0));
        assert!(point_near_segment(Point::new(50.0, 4.0), a, b, 5.0));
        assert!(!point_near_segment(Point::new(50.0, 6.0), a, b, 5.0));
        // Beyond the end: distance to the endpoint, not the infinite line.
        assert!(!point_near_segment(Point::new(110.0, 0.0), a, b, 5.0));
        assert!(point_near_segment(Point::new(1.0, 1.0), a, a, 2.0));
    }

    #[test]
    fn unresolved_inputs_never_match() {
        let p = Point::new(0.0, 0.0);
        assert!(!point_in_box(p, None, pt(1.0, 1.0)));
        assert!(!point_near_segment(p, pt(0.0, 0.0), None, 100.0));
        assert!(!point_in_circle(p, None, 100.0));
        assert!(!point_in_square(p, None, 100.0));
        assert_eq!(nearest_corner(p, None, None, 0.5), None);
        assert_eq!(nearest_midpoint(p, pt(0.0, 0.0), None, 0.5), None);
    }

    #[test]
    fn circle_and_square() {
        let c = pt(10.0, 10.0);
        assert!(point_in_circle(Point::new(14.0, 13.0), c, 5.0));
        assert!(!point_in_circle(Point::new(14.0, 14.0), c, 5.0));
        assert!(point_in_square(Point::new(14.0, 14.0), c, 5.0));
    }

    #[test]
    fn corners_win_over_edges() {
        let (a, b) = (pt(0.0, 0.0), pt(100.0, 100.0));
        assert_eq!(nearest_corner(Point::new(3.0, 97.0), a, b, 0.1), Some(Corner::BottomLeft));
        assert_eq!(classify_box(Point::new(3.0, 50.0), a, b, 0.1), Some(BoxZone::Edge(Edge::Left)));
        assert_eq!(classify_box(Point::new(50.0, 50.0), a, b, 0.1), Some(BoxZone::Inside));
        assert_eq!(classify_box(Point::new(150.0, 50.0), a, b, 0.1), None);
    }

    #[test]
    fn corner_names_follow_the_current_quadrant() {
        // Same box, points given in either order.
        for (a, b) in [(pt(0.0, 0.0), pt(100.0, 100.0)), (pt(100.0, 100.0), pt(0.0, 0.0))] {
            assert_eq!(nearest_corner(Point::new(98.0, 1.0), a, b, 0.1), Some(Corner::TopRight));
            assert_eq!(nearest_corner(Point::new(99.0, 99.0), a, b, 0.1), Some(Corner::BottomRight));
        }
    }

    #[test]
    fn opposite_edges_of_a_thin_box_count_as_inside() {
        let (a, b) = (pt(0.0, 0.0), pt(100.0, 4.0));
        // With a 60% tolerance every point is near both left and right.
        assert_eq!(classify_box(Point::new(50.0, 2.0), a, b, 0.6), Some(BoxZone::Inside));
        assert_eq!(classify_box(Point::new(2.0, 2.0), a, b, 0.1), Some(BoxZone::Edge(Edge::Left)));
    }

    #[test]
    fn midpoint_requires_the_middle_of_an_edge() {
        let (a, b) = (pt(0.0, 0.0), pt(100.0, 100.0));
        assert_eq!(nearest_midpoint(Point::new(52.0, 2.0), a, b, 0.1), Some(Edge::Top));
        assert_eq!(nearest_midpoint(Point::new(70.0, 2.0), a, b, 0.1), None);
    }

    fn chart() -> (BarSeries, LinearViewport) {
        let rows: Vec<_> = (0..30).map(|_| (100.0, 101.0, 99.0, 100.0)).collect();
        let s = BarSeries::from_ohlc(0, HOUR, &rows);
        let vp = LinearViewport::new(&s, 10.0, 0.0, 200.0, 0.0, 200.0);
        (s, vp)
    }

    fn make(id: &str, kind: DrawingKind, pts: [LogicalPoint; 2], s: &BarSeries) -> Drawing {
        Drawing::new(DrawingId::intern(id), kind, pts, DrawingOptions::default(), s).unwrap()
    }

    #[test]
    fn topmost_body_wins() {
        let (s, vp) = chart();
        let under = make(
            "hit-under",
            DrawingKind::Box,
            [LogicalPoint::new(0, 150.0), LogicalPoint::new(10 * HOUR, 50.0)],
            &s,
        );
        let over = make(
            "hit-over",
            DrawingKind::Box,
            [LogicalPoint::new(5 * HOUR, 120.0), LogicalPoint::new(15 * HOUR, 80.0)],
            &s,
        );
        let drawings = vec![under, over];
        let hit = hit_test(&drawings, &vp, &s, Point::new(70.0, 100.0), &HitConfig::default()).unwrap();
        assert_eq!(hit, Hit { id: DrawingId::intern("hit-over"), target: HitTarget::Body });
        let hit = hit_test(&drawings, &vp, &s, Point::new(20.0, 100.0), &HitConfig::default()).unwrap();
        assert_eq!(hit.id, DrawingId::intern("hit-under"));
        assert_eq!(hit_test(&drawings, &vp, &s, Point::new(250.0, 10.0), &HitConfig::default()), None);
    }

    #[test]
    fn selected_handle_beats_a_body_on_top() {
        let (s, vp) = chart();
        let mut line = make(
            "hit-line",
            DrawingKind::Line,
            [LogicalPoint::new(2 * HOUR, 100.0), LogicalPoint::new(12 * HOUR, 100.0)],
            &s,
        );
        line.selected = true;
        let cover = make(
            "hit-cover",
            DrawingKind::Box,
            [LogicalPoint::new(0, 190.0), LogicalPoint::new(20 * HOUR, 10.0)],
            &s,
        );
        let drawings = vec![line, cover];
        let hit = hit_test(&drawings, &vp, &s, Point::new(121.0, 101.0), &HitConfig::default()).unwrap();
        assert_eq!(hit.id, DrawingId::intern("hit-line"));
        assert_eq!(hit.handle().map(|h| h.name), Some(HandleName::P2));
    }

    #[test]
    fn unselected_drawings_expose_no_handles() {
        let (s, vp) = chart();
        let line = make(
            "hit-plain",
            DrawingKind::Line,
            [LogicalPoint::new(2 * HOUR, 100.0), LogicalPoint::new(12 * HOUR, 100.0)],
            &s,
        );
        let hit = hit_test(&[line], &vp, &s, Point::new(120.0, 100.0), &HitConfig::default()).unwrap();
        assert_eq!(hit.target, HitTarget::Body);
    }

    #[test]
    fn box_corner_zone_maps_to_handle() {
        let (s, vp) = chart();
        let mut b = make(
            "hit-zone",
            DrawingKind::Box,
            [LogicalPoint::new(0, 200.0), LogicalPoint::new(20 * HOUR, 0.0)],
            &s,
        );
        b.hovered = true;
        // 200×200 box: 10% zone is 20px, handle radius only 6px.
        let hit = hit_test(&[b], &vp, &s, Point::new(185.0, 186.0), &HitConfig::default()).unwrap();
        assert_eq!(hit.handle().map(|h| h.name), Some(HandleName::BottomRight));
    }

    #[test]
    fn previews_are_invisible_to_hit_testing() {
        let (s, vp) = chart();
        let mut b = make(
            "hit-preview",
            DrawingKind::Box,
            [LogicalPoint::new(0, 150.0), LogicalPoint::new(10 * HOUR, 50.0)],
            &s,
        );
        b.is_preview = true;
        assert_eq!(hit_test(&[b], &vp, &s, Point::new(50.0, 100.0), &HitConfig::default()), None);
    }
}
