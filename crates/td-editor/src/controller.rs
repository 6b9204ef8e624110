//! Interaction controller: hover, drag and resize of existing drawings.
//!
//! ```text
//! Idle ──down on handle──▶ Resizing ──up──▶ Idle
//! Idle ──down on body────▶ Dragging ──up──▶ Idle
//! Idle ──down elsewhere──▶ Idle (selection cleared)
//! ```
//!
//! Nothing is written until the pointer has travelled past the movement
//! threshold; the same latch hides handles for the rest of the gesture.
//! Modifiers come from the live keyboard state, and a modifier change
//! mid-gesture replays the last pointer position.

use crate::board::{Board, CommitAction, CommitEvent};
use crate::config::InteractionConfig;
use crate::input::{Modifiers, Pointer};
use crate::threshold::MovementThreshold;
use smallvec::SmallVec;
use td_core::coords::{self, ChartViewport};
use td_core::{Anchor, BarSeries, DrawingId, DrawingKind, LogicalPoint, Points};
use td_hit::handles::{Handles, name_for_role};
use td_hit::{Cursor, HandleName, HandleRole, HitConfig, HitTarget, SnapMode, cursor_for, handles_for, hit_test, project_drawing, snap_mode_for};

// ─── Magnet ──────────────────────────────────────────────────────────────

/// Snap `point` to the nearest bar value under it. The point moves onto the
/// bar's time; points off the loaded bars, or over placeholder bars, come
/// back unchanged.
pub fn magnet_snap(point: LogicalPoint, series: &BarSeries, mode: SnapMode) -> LogicalPoint {
    let Some(index) = point.resolved_index(series).map(f64::round) else {
        return point;
    };
    if index < 0.0 {
        return point;
    }
    let Some(bar) = series.get(index as usize) else {
        return point;
    };
    let candidates: SmallVec<[f64; 4]> = match mode {
        SnapMode::Ohlc => bar.values(),
        SnapMode::Extremes => [bar.high, bar.low].into_iter().flatten().collect(),
    };
    let nearest = candidates
        .into_iter()
        .min_by(|a, b| (a - point.price).abs().total_cmp(&(b - point.price).abs()));
    match nearest {
        Some(price) => LogicalPoint {
            time: Some(bar.time),
            price,
            logical_index: Some(index),
        },
        None => point,
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Dragging,
    Resizing,
}

/// The single active gesture.
#[derive(Debug, Clone)]
struct Session {
    mode: GestureMode,
    id: DrawingId,
    kind: DrawingKind,
    /// Current name of the grabbed handle; follows the screen ordering.
    handle: Option<HandleName>,
    /// Coordinates the grabbed handle writes; fixed for the gesture.
    role: HandleRole,
    snap: SnapMode,
    /// Logical point under the pointer at pointer-down.
    origin: LogicalPoint,
    origin_points: Points,
    threshold: MovementThreshold,
    last: Pointer,
}

/// How a gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEnd {
    pub id: DrawingId,
    pub mode: GestureMode,
    /// The pointer passed the threshold and the edit was committed.
    pub committed: Option<CommitEvent>,
}

#[derive(Default)]
pub struct InteractionController {
    session: Option<Session>,
    cursor: Cursor,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> Option<GestureMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    pub fn active_id(&self) -> Option<DrawingId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Name of the handle being resized, under the current screen ordering.
    pub fn active_handle(&self) -> Option<HandleName> {
        self.session.as_ref().and_then(|s| s.handle)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Handles show while idle and until a gesture passes its threshold.
    pub fn handles_visible(&self) -> bool {
        self.session.as_ref().is_none_or(|s| !s.threshold.passed())
    }

    /// Handles to paint: those of selected or hovered drawings.
    pub fn visible_handles(&self, board: &Board, viewport: &dyn ChartViewport) -> Vec<(DrawingId, Handles)> {
        if !self.handles_visible() {
            return Vec::new();
        }
        board
            .drawings()
            .iter()
            .filter(|d| (d.selected || d.hovered) && !d.is_preview)
            .map(|d| (d.id, handles_for(&project_drawing(d, viewport, board.series()))))
            .filter(|(_, h)| !h.is_empty())
            .collect()
    }

    /// Start a gesture on whatever is under the pointer. Returns the drawing
    /// being dragged or resized; a press on empty space clears the
    /// selection and returns `None`.
    pub fn pointer_down(
        &mut self,
        board: &mut Board,
        viewport: &dyn ChartViewport,
        pointer: Pointer,
        config: &InteractionConfig,
    ) -> Option<DrawingId> {
        if self.session.is_some() {
            log::debug!("pointer down during a gesture, ignoring");
            return None;
        }
        let hit = hit_test(board.drawings(), viewport, board.series(), pointer.point(), &config.hit);
        let Some(hit) = hit else {
            board.clear_selection();
            board.set_hovered(None);
            self.cursor = Cursor::Default;
            return None;
        };
        let drawing = board.get(hit.id)?;
        let Some(origin) = coords::point_from_pixel(pointer.x, pointer.y, pointer.time, viewport, board.series()) else {
            log::debug!("{}: pointer down at an unresolvable position", hit.id);
            return None;
        };
        let (mode, handle, role) = match hit.target {
            HitTarget::Handle(h) => (GestureMode::Resizing, Some(h.name), h.role),
            HitTarget::Body => (GestureMode::Dragging, None, HandleRole::default()),
        };
        self.session = Some(Session {
            mode,
            id: hit.id,
            kind: drawing.kind,
            handle,
            role,
            snap: handle.map(snap_mode_for).unwrap_or_default(),
            origin,
            origin_points: drawing.points().iter().copied().collect(),
            threshold: MovementThreshold::new(pointer.point(), config.threshold_for(drawing.kind)),
            last: pointer,
        });
        board.select_only(hit.id);
        self.cursor = session_cursor(mode, handle);
        log::debug!("{}: {mode:?} via {handle:?}", hit.id);
        Some(hit.id)
    }

    /// Advance the gesture, or update hover when idle. Returns whether
    /// anything visible changed.
    pub fn pointer_move(
        &mut self,
        board: &mut Board,
        viewport: &dyn ChartViewport,
        pointer: Pointer,
        modifiers: Modifiers,
        config: &InteractionConfig,
    ) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.last = pointer;
                let crossed = !session.threshold.passed() && session.threshold.update(pointer.point());
                self.apply(board, viewport, modifiers) || crossed
            }
            None => self.hover(board, viewport, pointer, &config.hit),
        }
    }

    /// Finish the gesture. The final position is applied first; the edit is
    /// committed only if the pointer passed the threshold.
    pub fn pointer_up(
        &mut self,
        board: &mut Board,
        viewport: &dyn ChartViewport,
        pointer: Pointer,
        modifiers: Modifiers,
    ) -> Option<GestureEnd> {
        let session = self.session.as_mut()?;
        session.last = pointer;
        session.threshold.update(pointer.point());
        self.apply(board, viewport, modifiers);
        let session = self.session.take()?;
        let committed = session
            .threshold
            .passed()
            .then(|| board.commit(CommitAction::Update, session.id));
        self.cursor = match session.handle {
            Some(name) => cursor_for(name),
            None => Cursor::Move,
        };
        log::debug!("{}: {:?} ended, committed={}", session.id, session.mode, committed.is_some());
        Some(GestureEnd {
            id: session.id,
            mode: session.mode,
            committed,
        })
    }

    /// Re-apply the last pointer position under new modifiers.
    pub fn replay(&mut self, board: &mut Board, viewport: &dyn ChartViewport, modifiers: Modifiers) -> bool {
        self.apply(board, viewport, modifiers)
    }

    /// The bar series is about to be replaced by a new one. The gesture
    /// keeps its origin by time, so its cached bar indices are dropped.
    pub fn rebase(&mut self, outgoing: &BarSeries) {
        if let Some(s) = self.session.as_mut() {
            for p in std::iter::once(&mut s.origin).chain(s.origin_points.iter_mut()) {
                p.pin_time(outgoing);
                p.invalidate();
            }
        }
    }

    /// Forget the gesture and cursor override without committing or
    /// reverting anything.
    pub fn detach(&mut self) {
        if let Some(s) = self.session.take() {
            log::debug!("{}: gesture dropped on detach", s.id);
        }
        self.cursor = Cursor::Default;
    }

    fn hover(&mut self, board: &mut Board, viewport: &dyn ChartViewport, pointer: Pointer, config: &HitConfig) -> bool {
        let hit = hit_test(board.drawings(), viewport, board.series(), pointer.point(), config);
        let changed = board.set_hovered(hit.map(|h| h.id));
        let cursor = match hit.map(|h| h.target) {
            Some(HitTarget::Handle(h)) => cursor_for(h.name),
            Some(HitTarget::Body) => Cursor::Pointer,
            None => Cursor::Default,
        };
        let cursor_changed = cursor != self.cursor;
        self.cursor = cursor;
        changed || cursor_changed
    }

    /// Write the session's edit for its last pointer position.
    fn apply(&mut self, board: &mut Board, viewport: &dyn ChartViewport, modifiers: Modifiers) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        // Under the threshold the press is still a click: nothing moves.
        if !session.threshold.passed() {
            return false;
        }
        let points = match session.mode {
            GestureMode::Dragging => drag_points(session, board, viewport, modifiers),
            GestureMode::Resizing => resize_points(session, board, viewport, modifiers),
        };
        let Some(points) = points else {
            log::trace!("{}: pointer position did not resolve", session.id);
            return false;
        };
        let (id, role) = (session.id, session.role);
        board.set_points(id, &points);

        if let Some(session) = self.session.as_mut()
            && session.mode == GestureMode::Resizing
            && let Some(drawing) = board.get(id)
        {
            let projected = project_drawing(drawing, viewport, board.series());
            if let Some(name) = name_for_role(&projected, role)
                && Some(name) != session.handle
            {
                log::debug!("{id}: handle {:?} is now {name:?}", session.handle);
                session.handle = Some(name);
                self.cursor = cursor_for(name);
            }
        }
        true
    }
}

fn session_cursor(mode: GestureMode, handle: Option<HandleName>) -> Cursor {
    match (mode, handle) {
        (GestureMode::Resizing, Some(name)) => cursor_for(name),
        _ => Cursor::Move,
    }
}

/// Translate every control point by the same (Δlogical, Δprice) from the
/// gesture origin. Constrain locks the move to the dominant screen axis.
fn drag_points(session: &Session, board: &Board, viewport: &dyn ChartViewport, modifiers: Modifiers) -> Option<Points> {
    let series = board.series();
    let pointer = session.last;
    let current = coords::point_from_pixel(pointer.x, pointer.y, pointer.time, viewport, series)?;
    let mut d_logical = (current.resolved_index(series)? - session.origin.resolved_index(series)?).round();
    let mut d_price = current.price - session.origin.price;
    if modifiers.constrain() {
        let delta = pointer.point() - session.threshold.origin();
        if delta.x.abs() >= delta.y.abs() {
            d_price = 0.0;
        } else {
            d_logical = 0.0;
        }
    }
    session
        .origin_points
        .iter()
        .map(|p| shift_point(p, d_logical, d_price, series))
        .collect()
}

fn shift_point(p: &LogicalPoint, d_logical: f64, d_price: f64, series: &BarSeries) -> Option<LogicalPoint> {
    let price = p.price + d_price;
    if d_logical == 0.0 {
        return Some(LogicalPoint { price, ..*p });
    }
    let index = p.resolved_index(series)? + d_logical;
    Some(match coords::time_from_logical_index(series, index) {
        Some(t) => LogicalPoint::new(t, price).with_index(index),
        None => LogicalPoint::at_index(index, price),
    })
}

/// Write the pointer's coordinates into the control points the grabbed
/// handle owns.
fn resize_points(session: &Session, board: &Board, viewport: &dyn ChartViewport, modifiers: Modifiers) -> Option<Points> {
    let series = board.series();
    let drawing = board.get(session.id)?;
    let pointer = session.last;
    let mut p = coords::point_from_pixel(pointer.x, pointer.y, pointer.time, viewport, series)?;
    if modifiers.magnet() {
        p = magnet_snap(p, series, session.snap);
    }

    let mut points: Points = drawing.points().iter().copied().collect();
    let role = session.role;
    let is_endpoint = matches!(session.kind, DrawingKind::Line | DrawingKind::FibRetracement | DrawingKind::Ruler);
    if is_endpoint
        && modifiers.constrain()
        && let Some(other) = match role.price {
            Some(Anchor::Start) => points.get(Anchor::End.index()),
            Some(Anchor::End) => points.get(Anchor::Start.index()),
            _ => None,
        }
    {
        p.price = other.price;
    }

    if let Some(slot) = role.time.and_then(|a| points.get_mut(a.index())) {
        slot.time = p.time;
        slot.logical_index = p.logical_index;
    }
    if let Some(slot) = role.price.and_then(|a| points.get_mut(a.index())) {
        slot.price = p.price;
    }
    // A position's stop shares the entry time.
    if matches!(session.kind, DrawingKind::Position(_))
        && role.time == Some(Anchor::Entry)
        && let Some(entry) = points.get(Anchor::Entry.index()).copied()
        && let Some(stop) = points.get_mut(Anchor::Stop.index())
    {
        stop.time = entry.time;
        stop.logical_index = entry.logical_index;
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::DrawingMutation;
    use pretty_assertions::assert_eq;
    use td_core::{Bar, Drawing, DrawingOptions, LinearViewport};

    const HOUR: i64 = 3600;

    fn series(n: usize) -> BarSeries {
        let rows: Vec<_> = (0..n).map(|_| (100.0, 105.0, 98.0, 102.0)).collect();
        BarSeries::from_ohlc(0, HOUR, &rows)
    }

    /// x = 10 px per bar, y = (200 - price) * 2.
    fn viewport(s: &BarSeries) -> LinearViewport {
        LinearViewport::new(s, 10.0, 0.0, 200.0, 0.0, 400.0)
    }

    fn board_with(kind: DrawingKind, points: &[LogicalPoint], name: &str) -> (Board, DrawingId) {
        let s = series(100);
        let d = Drawing::new(DrawingId::intern(name), kind, points.iter().copied(), DrawingOptions::default(), &s).unwrap();
        let id = d.id;
        let mut board = Board::new(s);
        board.apply(DrawingMutation::Insert(Box::new(d)));
        board.drain_commits();
        (board, id)
    }

    #[test]
    fn magnet_picks_nearest_value() {
        let s = series(20);
        let p = LogicalPoint::at_index(3.2, 99.4);
        let ohlc = magnet_snap(p, &s, SnapMode::Ohlc);
        assert_eq!((ohlc.time, ohlc.price), (Some(3 * HOUR), 100.0));
        let ext = magnet_snap(p, &s, SnapMode::Extremes);
        assert_eq!(ext.price, 98.0);
    }

    #[test]
    fn magnet_leaves_points_off_data() {
        let s = series(20);
        let p = LogicalPoint::at_index(25.0, 99.4);
        assert_eq!(magnet_snap(p, &s, SnapMode::Ohlc), p);
        let sparse = BarSeries::new(vec![Bar::ohlc(0, 1.0, 2.0, 0.5, 1.5), Bar::placeholder(HOUR)]).unwrap();
        let q = LogicalPoint::at_index(1.0, 3.0);
        assert_eq!(magnet_snap(q, &sparse, SnapMode::Ohlc), q);
    }

    #[test]
    fn small_moves_do_not_edit() {
        let (mut board, id) = board_with(
            DrawingKind::Line,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-small",
        );
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        assert_eq!(ctl.pointer_down(&mut board, &vp, Pointer::new(150.0, 190.0), &config), Some(id));
        assert_eq!(ctl.mode(), Some(GestureMode::Dragging));
        ctl.pointer_move(&mut board, &vp, Pointer::new(152.0, 191.0), Modifiers::NONE, &config);
        assert!(ctl.handles_visible());
        let end = ctl.pointer_up(&mut board, &vp, Pointer::new(152.0, 191.0), Modifiers::NONE).unwrap();
        assert_eq!(end.committed, None);
        assert_eq!(board.get(id).unwrap().points()[0].time, Some(10 * HOUR));
        assert!(board.get(id).unwrap().selected);
    }

    #[test]
    fn handles_hide_after_threshold() {
        let (mut board, id) = board_with(
            DrawingKind::Line,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-hide",
        );
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        ctl.pointer_down(&mut board, &vp, Pointer::new(150.0, 190.0), &config);
        assert_eq!(ctl.visible_handles(&board, &vp).len(), 1);
        ctl.pointer_move(&mut board, &vp, Pointer::new(170.0, 190.0), Modifiers::NONE, &config);
        assert!(ctl.visible_handles(&board, &vp).is_empty());
        let end = ctl.pointer_up(&mut board, &vp, Pointer::new(170.0, 190.0), Modifiers::NONE).unwrap();
        assert_eq!(end.committed.map(|c| c.action), Some(CommitAction::Update));
        assert_eq!(board.get(id).unwrap().points()[0].time, Some(12 * HOUR));
        assert_eq!(ctl.visible_handles(&board, &vp).len(), 1);
    }

    #[test]
    fn endpoint_resize_with_constrain_keeps_level() {
        let (mut board, id) = board_with(
            DrawingKind::Line,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-level",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        // p2 sits at (200, 180).
        ctl.pointer_down(&mut board, &vp, Pointer::new(200.0, 180.0), &config);
        assert_eq!(ctl.active_handle(), Some(HandleName::P2));
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        ctl.pointer_move(&mut board, &vp, Pointer::new(300.0, 120.0), shift, &config);
        let p = board.get(id).unwrap().points()[1];
        assert_eq!((p.time, p.price), (Some(30 * HOUR), 100.0));

        // Releasing shift mid-gesture replays the last position.
        assert!(ctl.replay(&mut board, &vp, Modifiers::NONE));
        assert_eq!(board.get(id).unwrap().points()[1].price, 140.0);
    }

    #[test]
    fn position_entry_moves_stop_time() {
        let (mut board, id) = board_with(
            DrawingKind::Position(td_core::Side::Long),
            &[
                LogicalPoint::new(10 * HOUR, 100.0),
                LogicalPoint::new(30 * HOUR, 110.0),
                LogicalPoint::new(10 * HOUR, 90.0),
            ],
            "ctl-entry",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        ctl.pointer_down(&mut board, &vp, Pointer::new(100.0, 200.0), &config);
        assert_eq!(ctl.active_handle(), Some(HandleName::Entry));
        ctl.pointer_move(&mut board, &vp, Pointer::new(150.0, 196.0), Modifiers::NONE, &config);
        let d = board.get(id).unwrap();
        assert_eq!(d.point(Anchor::Entry).unwrap().time, Some(15 * HOUR));
        assert_eq!(d.point(Anchor::Entry).unwrap().price, 102.0);
        assert_eq!(d.point(Anchor::Stop).unwrap().time, Some(15 * HOUR));
        assert_eq!(d.point(Anchor::Stop).unwrap().price, 90.0);
    }

    #[test]
    fn small_resize_does_not_edit() {
        let (mut board, id) = board_with(
            DrawingKind::Line,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-small-resize",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        ctl.pointer_down(&mut board, &vp, Pointer::new(200.0, 180.0), &config);
        assert_eq!(ctl.mode(), Some(GestureMode::Resizing));
        assert!(!ctl.pointer_move(&mut board, &vp, Pointer::new(202.0, 181.0), Modifiers::NONE, &config));
        let end = ctl.pointer_up(&mut board, &vp, Pointer::new(202.0, 181.0), Modifiers::NONE).unwrap();
        assert_eq!(end.committed, None);
        let p = board.get(id).unwrap().points()[1];
        assert_eq!((p.time, p.price), (Some(20 * HOUR), 110.0));
    }

    #[test]
    fn box_top_edge_moves_price_only() {
        let (mut board, id) = board_with(
            DrawingKind::Box,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-top-edge",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        // Top edge midpoint sits at (150, 180).
        ctl.pointer_down(&mut board, &vp, Pointer::new(150.0, 180.0), &config);
        assert_eq!(ctl.active_handle(), Some(HandleName::Top));
        ctl.pointer_move(&mut board, &vp, Pointer::new(170.0, 160.0), Modifiers::NONE, &config);
        let end = ctl.pointer_up(&mut board, &vp, Pointer::new(170.0, 160.0), Modifiers::NONE).unwrap();
        assert_eq!(end.committed.map(|c| c.action), Some(CommitAction::Update));
        let d = board.get(id).unwrap();
        let start = d.point(Anchor::Start).unwrap();
        let stop = d.point(Anchor::End).unwrap();
        assert_eq!((start.time, start.price), (Some(10 * HOUR), 100.0));
        assert_eq!((stop.time, stop.price), (Some(20 * HOUR), 120.0));
    }

    #[test]
    fn short_stop_handle_moves_stop_not_target() {
        let (mut board, id) = board_with(
            DrawingKind::Position(td_core::Side::Short),
            &[
                LogicalPoint::new(10 * HOUR, 100.0),
                LogicalPoint::new(30 * HOUR, 90.0),
                LogicalPoint::new(10 * HOUR, 110.0),
            ],
            "ctl-short-stop",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        // Stop sits above the entry for a short: (100, 180).
        ctl.pointer_down(&mut board, &vp, Pointer::new(100.0, 180.0), &config);
        assert_eq!(ctl.active_handle(), Some(HandleName::Stop));
        ctl.pointer_move(&mut board, &vp, Pointer::new(100.0, 170.0), Modifiers::NONE, &config);
        ctl.pointer_up(&mut board, &vp, Pointer::new(100.0, 170.0), Modifiers::NONE);
        let d = board.get(id).unwrap();
        assert_eq!(d.point(Anchor::Stop).unwrap().price, 115.0);
        assert_eq!(d.point(Anchor::Stop).unwrap().time, Some(10 * HOUR));
        let target = d.point(Anchor::Target).unwrap();
        assert_eq!((target.time, target.price), (Some(30 * HOUR), 90.0));
    }

    #[test]
    fn position_end_handle_moves_target_time_only() {
        let (mut board, id) = board_with(
            DrawingKind::Position(td_core::Side::Long),
            &[
                LogicalPoint::new(10 * HOUR, 100.0),
                LogicalPoint::new(30 * HOUR, 110.0),
                LogicalPoint::new(10 * HOUR, 96.0),
            ],
            "ctl-end",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        // Right edge at the entry price: (300, 200).
        ctl.pointer_down(&mut board, &vp, Pointer::new(300.0, 200.0), &config);
        assert_eq!(ctl.active_handle(), Some(HandleName::End));
        ctl.pointer_move(&mut board, &vp, Pointer::new(400.0, 150.0), Modifiers::NONE, &config);
        ctl.pointer_up(&mut board, &vp, Pointer::new(400.0, 150.0), Modifiers::NONE);
        let d = board.get(id).unwrap();
        let target = d.point(Anchor::Target).unwrap();
        assert_eq!((target.time, target.price), (Some(40 * HOUR), 110.0));
        let entry = d.point(Anchor::Entry).unwrap();
        assert_eq!((entry.time, entry.price), (Some(10 * HOUR), 100.0));
        let stop = d.point(Anchor::Stop).unwrap();
        assert_eq!((stop.time, stop.price), (Some(10 * HOUR), 96.0));
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let (mut board, id) = board_with(
            DrawingKind::Box,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-empty",
        );
        board.select_only(id);
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.pointer_down(&mut board, &vp, Pointer::new(800.0, 20.0), &InteractionConfig::default()), None);
        assert!(board.selected_ids().is_empty());
        assert!(!ctl.is_active());
    }

    #[test]
    fn hover_sets_cursor() {
        let (mut board, id) = board_with(
            DrawingKind::Box,
            &[LogicalPoint::new(10 * HOUR, 100.0), LogicalPoint::new(20 * HOUR, 110.0)],
            "ctl-hover",
        );
        let vp = viewport(board.series());
        let mut ctl = InteractionController::new();
        let config = InteractionConfig::default();
        assert!(ctl.pointer_move(&mut board, &vp, Pointer::new(150.0, 190.0), Modifiers::NONE, &config));
        assert!(board.get(id).unwrap().hovered);
        assert_eq!(ctl.cursor(), Cursor::Pointer);
        // Hovered now, so the corner handle is live.
        ctl.pointer_move(&mut board, &vp, Pointer::new(200.0, 200.0), Modifiers::NONE, &config);
        assert_eq!(ctl.cursor(), Cursor::NwseResize);
        ctl.pointer_move(&mut board, &vp, Pointer::new(800.0, 20.0), Modifiers::NONE, &config);
        assert!(!board.get(id).unwrap().hovered);
        assert_eq!(ctl.cursor(), Cursor::Default);
    }
}
