//! Screen projection: a drawing's logical points → pixel-space shape.
//!
//! Projection is recomputed whenever the view changes; nothing here is
//! cached. A control point that cannot be resolved leaves its slot `None`,
//! and any shape depending on it is dropped.

use kurbo::{Line, Point, Rect};
use smallvec::SmallVec;
use td_core::coords::{self, ChartViewport};
use td_core::geometry::Geometry;
use td_core::{BarSeries, Drawing, DrawingId, DrawingKind};

/// The pixel-space outline of a drawing, used for body hit testing and for
/// placing handles.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenShape {
    Segment(Line),
    Rect(Rect),
    Fib {
        rect: Rect,
        levels: SmallVec<[Line; 7]>,
    },
    Position {
        entry: Line,
        profit: Rect,
        loss: Rect,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub id: DrawingId,
    pub kind: DrawingKind,
    /// Control points in point order.
    pub points: SmallVec<[Option<Point>; 3]>,
    pub shape: Option<ScreenShape>,
}

impl Projected {
    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied().flatten()
    }
}

pub fn project_drawing(drawing: &Drawing, viewport: &dyn ChartViewport, series: &BarSeries) -> Projected {
    let points = coords::project(drawing, viewport, series);
    let shape = shape_of(drawing, &points, viewport);
    Projected {
        id: drawing.id,
        kind: drawing.kind,
        points,
        shape,
    }
}

fn shape_of(drawing: &Drawing, points: &[Option<Point>], viewport: &dyn ChartViewport) -> Option<ScreenShape> {
    match (drawing.kind, points) {
        (DrawingKind::Line | DrawingKind::Ruler, [Some(a), Some(b)]) => Some(ScreenShape::Segment(Line::new(*a, *b))),
        (DrawingKind::Box, [Some(a), Some(b)]) => Some(ScreenShape::Rect(Rect::from_points(*a, *b))),
        (DrawingKind::FibRetracement, [Some(a), Some(b)]) => {
            let rect = Rect::from_points(*a, *b);
            let Geometry::Fib(fib) = drawing.geometry() else {
                return Some(ScreenShape::Rect(rect));
            };
            let levels = fib
                .levels
                .iter()
                .filter_map(|level| viewport.price_to_pixel(level.price))
                .map(|y| Line::new((rect.x0, y), (rect.x1, y)))
                .collect();
            Some(ScreenShape::Fib { rect, levels })
        }
        (DrawingKind::Position(_), [Some(entry), Some(target), stop]) => {
            let stop_y = match stop {
                Some(p) => p.y,
                None => viewport.price_to_pixel(drawing.points().get(2)?.price)?,
            };
            let (x0, x1) = (entry.x, target.x);
            Some(ScreenShape::Position {
                entry: Line::new((x0, entry.y), (x1, entry.y)),
                profit: Rect::new(x0, entry.y, x1, target.y).abs(),
                loss: Rect::new(x0, entry.y, x1, stop_y).abs(),
            })
        }
        _ => {
            log::trace!("{}: shape unresolved", drawing.id);
            None
        }
    }
}
