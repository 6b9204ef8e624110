//! Resize handles per drawing topology.
//!
//! Handles are ephemeral: they are enumerated from the current screen
//! projection every frame and never stored. A handle's *name* describes
//! where it sits on screen (`TopLeft`, `Bottom`, ...); its *role* describes
//! which control-point coordinates it writes. Names are always derived from
//! the current screen ordering, so after a corner is dragged past its
//! opposite, the handle writing the same coordinates comes back under a new
//! name.

use crate::hit::{Corner, Edge};
use crate::project::Projected;
use kurbo::{Point, Rect};
use serde::Serialize;
use smallvec::SmallVec;
use td_core::{Anchor, DrawingKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HandleName {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    P1,
    P2,
    Entry,
    Target,
    Stop,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleShape {
    Circle,
    Square,
}

/// Which control-point coordinates a handle writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandleRole {
    pub time: Option<Anchor>,
    pub price: Option<Anchor>,
}

impl HandleRole {
    pub const fn both(anchor: Anchor) -> Self {
        Self {
            time: Some(anchor),
            price: Some(anchor),
        }
    }

    pub const fn time(anchor: Anchor) -> Self {
        Self {
            time: Some(anchor),
            price: None,
        }
    }

    pub const fn price(anchor: Anchor) -> Self {
        Self {
            time: None,
            price: Some(anchor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub name: HandleName,
    pub role: HandleRole,
    pub shape: HandleShape,
    pub position: Point,
}

impl From<Corner> for HandleName {
    fn from(c: Corner) -> Self {
        match c {
            Corner::TopLeft => HandleName::TopLeft,
            Corner::TopRight => HandleName::TopRight,
            Corner::BottomLeft => HandleName::BottomLeft,
            Corner::BottomRight => HandleName::BottomRight,
        }
    }
}

impl From<Edge> for HandleName {
    fn from(e: Edge) -> Self {
        match e {
            Edge::Top => HandleName::Top,
            Edge::Bottom => HandleName::Bottom,
            Edge::Left => HandleName::Left,
            Edge::Right => HandleName::Right,
        }
    }
}

// ─── Enumeration ─────────────────────────────────────────────────────────

pub type Handles = SmallVec<[Handle; 8]>;

/// All handles of a projected drawing. Empty when its points don't resolve.
pub fn handles_for(projected: &Projected) -> Handles {
    match projected.kind {
        DrawingKind::Box => box_handles(projected),
        DrawingKind::Position(_) => position_handles(projected),
        DrawingKind::Line | DrawingKind::FibRetracement | DrawingKind::Ruler => {
            let mut out = Handles::new();
            for (i, (name, anchor)) in [(HandleName::P1, Anchor::Start), (HandleName::P2, Anchor::End)]
                .into_iter()
                .enumerate()
            {
                if let Some(position) = projected.point(i) {
                    out.push(Handle {
                        name,
                        role: HandleRole::both(anchor),
                        shape: HandleShape::Circle,
                        position,
                    });
                }
            }
            out
        }
    }
}

fn box_handles(projected: &Projected) -> Handles {
    let (Some(a), Some(b)) = (projected.point(0), projected.point(1)) else {
        return Handles::new();
    };
    // Ties keep the first point on the left/top.
    let (left, right) = if a.x <= b.x { (Anchor::Start, Anchor::End) } else { (Anchor::End, Anchor::Start) };
    let (top, bottom) = if a.y <= b.y { (Anchor::Start, Anchor::End) } else { (Anchor::End, Anchor::Start) };
    let r = Rect::from_points(a, b);
    let c = r.center();

    let corner = |name, x, y, time, price| Handle {
        name,
        role: HandleRole {
            time: Some(time),
            price: Some(price),
        },
        shape: HandleShape::Circle,
        position: Point::new(x, y),
    };
    let mid = |name, x, y, role| Handle {
        name,
        role,
        shape: HandleShape::Square,
        position: Point::new(x, y),
    };

    smallvec::smallvec![
        corner(HandleName::TopLeft, r.x0, r.y0, left, top),
        corner(HandleName::TopRight, r.x1, r.y0, right, top),
        corner(HandleName::BottomLeft, r.x0, r.y1, left, bottom),
        corner(HandleName::BottomRight, r.x1, r.y1, right, bottom),
        mid(HandleName::Top, c.x, r.y0, HandleRole::price(top)),
        mid(HandleName::Bottom, c.x, r.y1, HandleRole::price(bottom)),
        mid(HandleName::Left, r.x0, c.y, HandleRole::time(left)),
        mid(HandleName::Right, r.x1, c.y, HandleRole::time(right)),
    ]
}

/// Entry, target and stop sit on the left edge at their prices; `End` sits
/// on the right edge at the entry price. For a long the target is above the
/// entry on screen, for a short below.
fn position_handles(projected: &Projected) -> Handles {
    let (Some(entry), Some(target), Some(stop)) = (projected.point(0), projected.point(1), projected.point(2)) else {
        return Handles::new();
    };
    let x0 = entry.x;
    smallvec::smallvec![
        Handle {
            name: HandleName::Entry,
            role: HandleRole::both(Anchor::Entry),
            shape: HandleShape::Circle,
            position: entry,
        },
        Handle {
            name: HandleName::Target,
            role: HandleRole::price(Anchor::Target),
            shape: HandleShape::Square,
            position: Point::new(x0, target.y),
        },
        Handle {
            name: HandleName::Stop,
            role: HandleRole::price(Anchor::Stop),
            shape: HandleShape::Square,
            position: Point::new(x0, stop.y),
        },
        Handle {
            name: HandleName::End,
            role: HandleRole::time(Anchor::Target),
            shape: HandleShape::Square,
            position: Point::new(target.x, entry.y),
        },
    ]
}

pub fn find_handle(handles: &[Handle], name: HandleName) -> Option<Handle> {
    handles.iter().find(|h| h.name == name).copied()
}

/// The name of the handle that writes `role` under the current screen
/// ordering. This is how a dragged handle picks up its new name after it
/// passes a sibling.
pub fn name_for_role(projected: &Projected, role: HandleRole) -> Option<HandleName> {
    handles_for(projected).iter().find(|h| h.role == role).map(|h| h.name)
}

// ─── Cursor & snapping ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
    Move,
    Crosshair,
    NsResize,
    EwResize,
    NwseResize,
    NeswResize,
}

impl Cursor {
    /// The CSS `cursor` value.
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
            Cursor::Move => "move",
            Cursor::Crosshair => "crosshair",
            Cursor::NsResize => "ns-resize",
            Cursor::EwResize => "ew-resize",
            Cursor::NwseResize => "nwse-resize",
            Cursor::NeswResize => "nesw-resize",
        }
    }
}

pub fn cursor_for(name: HandleName) -> Cursor {
    match name {
        HandleName::TopLeft | HandleName::BottomRight => Cursor::NwseResize,
        HandleName::TopRight | HandleName::BottomLeft => Cursor::NeswResize,
        HandleName::Top | HandleName::Bottom | HandleName::Target | HandleName::Stop => Cursor::NsResize,
        HandleName::Left | HandleName::Right | HandleName::End => Cursor::EwResize,
        HandleName::P1 | HandleName::P2 => Cursor::Pointer,
        HandleName::Entry => Cursor::Move,
    }
}

/// Which bar values a magnet snaps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapMode {
    /// Nearest of open, high, low, close.
    #[default]
    Ohlc,
    /// Nearest of high and low only.
    Extremes,
}

pub fn snap_mode_for(name: HandleName) -> SnapMode {
    match name {
        HandleName::Target | HandleName::Stop => SnapMode::Extremes,
        _ => SnapMode::Ohlc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use td_core::{DrawingId, Side};

    fn projected(kind: DrawingKind, pts: &[(f64, f64)]) -> Projected {
        Projected {
            id: DrawingId::intern("handles-test"),
            kind,
            points: pts.iter().map(|&(x, y)| Some(Point::new(x, y))).collect(),
            shape: None,
        }
    }

    #[test]
    fn box_has_four_corners_and_four_midpoints() {
        let p = projected(DrawingKind::Box, &[(0.0, 0.0), (100.0, 50.0)]);
        let hs = handles_for(&p);
        assert_eq!(hs.len(), 8);
        let br = find_handle(&hs, HandleName::BottomRight).unwrap();
        assert_eq!(br.position, Point::new(100.0, 50.0));
        assert_eq!(br.role, HandleRole::both(Anchor::End));
        assert_eq!(br.shape, HandleShape::Circle);
        let top = find_handle(&hs, HandleName::Top).unwrap();
        assert_eq!(top.position, Point::new(50.0, 0.0));
        assert_eq!(top.shape, HandleShape::Square);
    }

    #[test]
    fn corner_name_follows_screen_ordering() {
        // End point dragged up and left of the start point.
        let p = projected(DrawingKind::Box, &[(50.0, 50.0), (10.0, 10.0)]);
        assert_eq!(name_for_role(&p, HandleRole::both(Anchor::End)), Some(HandleName::TopLeft));
        assert_eq!(name_for_role(&p, HandleRole::both(Anchor::Start)), Some(HandleName::BottomRight));

        // Mixed corner: time from one point, price from the other.
        let mixed = HandleRole {
            time: Some(Anchor::End),
            price: Some(Anchor::Start),
        };
        assert_eq!(name_for_role(&p, mixed), Some(HandleName::BottomLeft));
        assert_eq!(name_for_role(&p, HandleRole::price(Anchor::End)), Some(HandleName::Top));
    }

    #[test]
    fn position_handles_invert_between_sides() {
        let long = projected(DrawingKind::Position(Side::Long), &[(10.0, 100.0), (90.0, 60.0), (10.0, 120.0)]);
        let hs = handles_for(&long);
        assert_eq!(hs.len(), 4);
        assert!(find_handle(&hs, HandleName::Target).unwrap().position.y < 100.0);
        assert_eq!(find_handle(&hs, HandleName::End).unwrap().position, Point::new(90.0, 100.0));

        let short = projected(DrawingKind::Position(Side::Short), &[(10.0, 100.0), (90.0, 140.0), (10.0, 80.0)]);
        let hs = handles_for(&short);
        assert!(find_handle(&hs, HandleName::Target).unwrap().position.y > 100.0);
        assert!(find_handle(&hs, HandleName::Stop).unwrap().position.y < 100.0);
    }

    #[test]
    fn unresolved_points_give_no_handles() {
        let mut p = projected(DrawingKind::Line, &[(0.0, 0.0), (1.0, 1.0)]);
        p.points[1] = None;
        let hs = handles_for(&p);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].name, HandleName::P1);

        let mut b = projected(DrawingKind::Box, &[(0.0, 0.0), (1.0, 1.0)]);
        b.points[0] = None;
        assert!(handles_for(&b).is_empty());
    }

    #[test]
    fn cursors_and_snap_modes() {
        assert_eq!(cursor_for(HandleName::TopLeft).as_css(), "nwse-resize");
        assert_eq!(cursor_for(HandleName::BottomLeft).as_css(), "nesw-resize");
        assert_eq!(cursor_for(HandleName::End).as_css(), "ew-resize");
        assert_eq!(snap_mode_for(HandleName::Stop), SnapMode::Extremes);
        assert_eq!(snap_mode_for(HandleName::P2), SnapMode::Ohlc);
    }
}
