//! Creation tools.
//!
//! Each tool translates pointer input into `DrawingMutation`s for the
//! board. Tools are one-shot: once a drawing is finalized the tool reports
//! `is_done()` and the router falls back to selection.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Two-point tools | Position tools |
//! |----------|-----------------|----------------|
//! | **Ctrl/⌘** | Snap to bar OHLC | Snap entry to bar OHLC |
//! | **Shift** | Keep p2 at p1's price | n/a |

use crate::board::DrawingMutation;
use crate::config::InteractionConfig;
use crate::controller::magnet_snap;
use crate::input::{InputEvent, Modifiers, Pointer};
use crate::threshold::MovementThreshold;
use td_core::coords::{self, ChartViewport};
use td_core::{BarSeries, Drawing, DrawingId, DrawingKind, DrawingOptions, LogicalPoint, Side};
use td_hit::SnapMode;

/// The active tool determines how pointer events on empty chart space are
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Line,
    Box,
    Fib,
    Ruler,
    LongPosition,
    ShortPosition,
}

impl ToolKind {
    /// The drawing kind this tool creates; `None` for selection.
    pub fn drawing_kind(self) -> Option<DrawingKind> {
        Some(match self {
            ToolKind::Select => return None,
            ToolKind::Line => DrawingKind::Line,
            ToolKind::Box => DrawingKind::Box,
            ToolKind::Fib => DrawingKind::FibRetracement,
            ToolKind::Ruler => DrawingKind::Ruler,
            ToolKind::LongPosition => DrawingKind::Position(Side::Long),
            ToolKind::ShortPosition => DrawingKind::Position(Side::Short),
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "select" => ToolKind::Select,
            "line" | "trendline" => ToolKind::Line,
            "box" | "rectangle" => ToolKind::Box,
            "fib" | "fib_retracement" => ToolKind::Fib,
            "ruler" => ToolKind::Ruler,
            "long" | "long_position" => ToolKind::LongPosition,
            "short" | "short_position" => ToolKind::ShortPosition,
            _ => return None,
        })
    }
}

/// Everything a tool may read while handling an event.
pub struct ToolContext<'a> {
    pub viewport: &'a dyn ChartViewport,
    pub series: &'a BarSeries,
    /// Live keyboard state, not the modifiers of the pointer event.
    pub modifiers: Modifiers,
    pub config: &'a InteractionConfig,
}

impl ToolContext<'_> {
    /// Pixel → logical point, snapped when the magnet modifier is held.
    fn resolve(&self, pointer: Pointer, mode: SnapMode) -> Option<LogicalPoint> {
        let p = coords::point_from_pixel(pointer.x, pointer.y, pointer.time, self.viewport, self.series)?;
        Some(if self.modifiers.magnet() { magnet_snap(p, self.series, mode) } else { p })
    }
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<DrawingMutation>;

    /// Re-run the last pointer position, e.g. after a modifier changed.
    fn replay(&mut self, _ctx: &ToolContext) -> Vec<DrawingMutation> {
        Vec::new()
    }

    /// The bar series is about to be replaced; drop any bar index cached
    /// against `outgoing`.
    fn rebase(&mut self, _outgoing: &BarSeries) {}

    /// Abandon the drawing in progress.
    fn cancel(&mut self) -> Vec<DrawingMutation>;

    /// A drawing is being placed.
    fn in_progress(&self) -> bool;

    /// The drawing was finalized; the tool has nothing more to do.
    fn is_done(&self) -> bool;
}

/// Build the tool for `kind`. Selection has no tool.
pub fn tool_for(kind: ToolKind) -> Option<Box<dyn Tool>> {
    match kind.drawing_kind()? {
        DrawingKind::Position(side) => Some(Box::new(PositionTool::new(side))),
        drawing_kind => Some(Box::new(TwoPointTool::new(kind, drawing_kind))),
    }
}

// ─── Two-point tools ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Placing {
        id: DrawingId,
        anchor: LogicalPoint,
        threshold: MovementThreshold,
        last: Pointer,
    },
    Done,
}

/// Line, box, Fib and ruler: the first click anchors p1 and spawns a
/// preview, moves drag p2, and a second click (or releasing after a drag)
/// finalizes.
pub struct TwoPointTool {
    tool: ToolKind,
    kind: DrawingKind,
    phase: Phase,
}

impl TwoPointTool {
    pub fn new(tool: ToolKind, kind: DrawingKind) -> Self {
        Self {
            tool,
            kind,
            phase: Phase::Idle,
        }
    }

    fn end_point(&self, anchor: LogicalPoint, pointer: Pointer, ctx: &ToolContext) -> Option<LogicalPoint> {
        let mut p = ctx.resolve(pointer, SnapMode::Ohlc)?;
        if ctx.modifiers.constrain() {
            p.price = anchor.price;
        }
        Some(p)
    }

    fn start(&mut self, pointer: Pointer, ctx: &ToolContext) -> Vec<DrawingMutation> {
        let Some(anchor) = ctx.resolve(pointer, SnapMode::Ohlc) else {
            log::debug!("{:?}: pointer down off the chart", self.tool);
            return Vec::new();
        };
        let id = DrawingId::generate();
        let mut preview = match Drawing::new(id, self.kind, [anchor, anchor], DrawingOptions::default(), ctx.series) {
            Ok(d) => d,
            Err(e) => {
                log::debug!("{:?}: cannot start drawing: {e}", self.tool);
                return Vec::new();
            }
        };
        preview.is_preview = true;
        preview.selected = true;
        self.phase = Phase::Placing {
            id,
            anchor,
            threshold: MovementThreshold::new(pointer.point(), ctx.config.drag_threshold),
            last: pointer,
        };
        log::debug!("{:?}: placing {id}", self.tool);
        vec![DrawingMutation::Insert(Box::new(preview))]
    }

    fn finish(&mut self, id: DrawingId, anchor: LogicalPoint, pointer: Pointer, ctx: &ToolContext) -> Vec<DrawingMutation> {
        let mut out = Vec::new();
        if let Some(end) = self.end_point(anchor, pointer, ctx) {
            out.push(DrawingMutation::SetPoints {
                id,
                points: [anchor, end].into_iter().collect(),
            });
        }
        out.push(DrawingMutation::Finalize { id });
        self.phase = Phase::Done;
        out
    }
}

impl Tool for TwoPointTool {
    fn kind(&self) -> ToolKind {
        self.tool
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<DrawingMutation> {
        let Some(pointer) = Pointer::of(event) else {
            return Vec::new();
        };
        match (self.phase, event) {
            (Phase::Idle, InputEvent::PointerDown { .. }) => self.start(pointer, ctx),
            (Phase::Placing { id, anchor, .. }, InputEvent::PointerDown { .. }) => {
                self.finish(id, anchor, pointer, ctx)
            }
            (
                Phase::Placing {
                    id,
                    anchor,
                    mut threshold,
                    ..
                },
                InputEvent::PointerMove { .. },
            ) => {
                threshold.update(pointer.point());
                self.phase = Phase::Placing {
                    id,
                    anchor,
                    threshold,
                    last: pointer,
                };
                match self.end_point(anchor, pointer, ctx) {
                    Some(end) => vec![DrawingMutation::SetPoints {
                        id,
                        points: [anchor, end].into_iter().collect(),
                    }],
                    None => Vec::new(),
                }
            }
            (
                Phase::Placing {
                    id,
                    anchor,
                    mut threshold,
                    ..
                },
                InputEvent::PointerUp { .. },
            ) => {
                // Press-drag-release draws in one gesture; a plain click
                // waits for the second click.
                if threshold.update(pointer.point()) {
                    self.finish(id, anchor, pointer, ctx)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn replay(&mut self, ctx: &ToolContext) -> Vec<DrawingMutation> {
        let Phase::Placing { id, anchor, last, .. } = self.phase else {
            return Vec::new();
        };
        match self.end_point(anchor, last, ctx) {
            Some(end) => vec![DrawingMutation::SetPoints {
                id,
                points: [anchor, end].into_iter().collect(),
            }],
            None => Vec::new(),
        }
    }

    fn rebase(&mut self, outgoing: &BarSeries) {
        if let Phase::Placing { anchor, .. } = &mut self.phase {
            anchor.pin_time(outgoing);
            anchor.invalidate();
        }
    }

    fn cancel(&mut self) -> Vec<DrawingMutation> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Placing { id, .. } => {
                log::debug!("{:?}: discarding {id}", self.tool);
                vec![DrawingMutation::Remove { id }]
            }
            _ => Vec::new(),
        }
    }

    fn in_progress(&self) -> bool {
        matches!(self.phase, Phase::Placing { .. })
    }

    fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

// ─── Position tools ──────────────────────────────────────────────────────

/// Long/short position: one click places the entry; target, stop and width
/// come from the config.
pub struct PositionTool {
    side: Side,
    done: bool,
}

impl PositionTool {
    pub fn new(side: Side) -> Self {
        Self { side, done: false }
    }

    fn build(&self, entry: LogicalPoint, ctx: &ToolContext) -> Option<Drawing> {
        let cfg = ctx.config;
        let (target_price, stop_price) = match self.side {
            Side::Long => (
                entry.price * (1.0 + cfg.position_target_pct),
                entry.price * (1.0 - cfg.position_stop_pct),
            ),
            Side::Short => (
                entry.price * (1.0 - cfg.position_target_pct),
                entry.price * (1.0 + cfg.position_stop_pct),
            ),
        };
        let end_index = entry.resolved_index(ctx.series)? + cfg.position_bars;
        let target = match coords::time_from_logical_index(ctx.series, end_index) {
            Some(t) => LogicalPoint::new(t, target_price).with_index(end_index),
            None => LogicalPoint::at_index(end_index, target_price),
        };
        let stop = LogicalPoint { price: stop_price, ..entry };
        let kind = DrawingKind::Position(self.side);
        match Drawing::new(DrawingId::generate(), kind, [entry, target, stop], DrawingOptions::default(), ctx.series) {
            Ok(mut d) => {
                d.selected = true;
                Some(d)
            }
            Err(e) => {
                log::debug!("{}: cannot place position: {e}", kind.name());
                None
            }
        }
    }
}

impl Tool for PositionTool {
    fn kind(&self) -> ToolKind {
        match self.side {
            Side::Long => ToolKind::LongPosition,
            Side::Short => ToolKind::ShortPosition,
        }
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<DrawingMutation> {
        let InputEvent::PointerDown { .. } = event else {
            return Vec::new();
        };
        if self.done {
            return Vec::new();
        }
        let Some(pointer) = Pointer::of(event) else {
            return Vec::new();
        };
        let Some(drawing) = ctx.resolve(pointer, SnapMode::Ohlc).and_then(|entry| self.build(entry, ctx)) else {
            return Vec::new();
        };
        self.done = true;
        vec![DrawingMutation::Insert(Box::new(drawing))]
    }

    fn cancel(&mut self) -> Vec<DrawingMutation> {
        Vec::new()
    }

    fn in_progress(&self) -> bool {
        false
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
