//! Screen-space scene description handed to the JS painter.
//!
//! The bridge does no painting itself: it projects every drawing through
//! the host viewport and serializes what the host needs to draw it
//! (points, style, Fib level lines, position zones, ruler labels, handles).

use serde::Serialize;
use td_core::geometry::Geometry;
use td_core::{BarSeries, ChartViewport, Drawing, DrawingId, DrawingOptions, PositionOutcome};
use td_editor::InputRouter;
use td_hit::{HandleName, HandleShape, Projected, ScreenShape, project_drawing};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem<'a> {
    pub id: DrawingId,
    pub kind: &'static str,
    pub selected: bool,
    pub hovered: bool,
    pub preview: bool,
    /// Control points in point order; `None` where unresolvable.
    pub points: Vec<Option<[f64; 2]>>,
    pub options: &'a DrawingOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<SceneLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<SceneZones>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneLevel {
    pub ratio: f64,
    pub price: f64,
    pub y: f64,
}

/// Rects are `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneZones {
    pub profit: [f64; 4],
    pub loss: [f64; 4],
    pub risk_reward: Option<f64>,
    pub outcome: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneHandle {
    pub id: DrawingId,
    pub name: HandleName,
    pub shape: HandleShape,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene<'a> {
    pub items: Vec<SceneItem<'a>>,
    pub handles: Vec<SceneHandle>,
    pub cursor: &'static str,
}

pub fn build_scene<'a>(router: &'a InputRouter, viewport: &dyn ChartViewport) -> Scene<'a> {
    let board = router.board();
    let items = board
        .drawings()
        .iter()
        .map(|d| scene_item(d, viewport, board.series()))
        .collect();
    let handles = router
        .handles(viewport)
        .into_iter()
        .flat_map(|(id, hs)| {
            hs.into_iter().map(move |h| SceneHandle {
                id,
                name: h.name,
                shape: h.shape,
                x: h.position.x,
                y: h.position.y,
            })
        })
        .collect();
    Scene {
        items,
        handles,
        cursor: router.cursor().as_css(),
    }
}

pub fn scene_item<'a>(drawing: &'a Drawing, viewport: &dyn ChartViewport, series: &BarSeries) -> SceneItem<'a> {
    let projected = project_drawing(drawing, viewport, series);
    let mut item = SceneItem {
        id: drawing.id,
        kind: drawing.kind.name(),
        selected: drawing.selected,
        hovered: drawing.hovered,
        preview: drawing.is_preview,
        points: projected.points.iter().map(|p| p.map(|p| [p.x, p.y])).collect(),
        options: &drawing.options,
        levels: Vec::new(),
        zones: None,
        label: None,
    };
    match drawing.geometry() {
        Geometry::Fib(fib) => {
            item.levels = fib
                .levels
                .iter()
                .filter_map(|l| {
                    viewport.price_to_pixel(l.price).map(|y| SceneLevel {
                        ratio: l.ratio,
                        price: l.price,
                        y,
                    })
                })
                .collect();
        }
        Geometry::Ruler(m) => {
            item.label = Some(format!("{}, {} bars", m.price_label(), m.bar_count_label()));
        }
        Geometry::Position(pos) => {
            item.zones = zones(&projected).map(|(profit, loss)| SceneZones {
                profit,
                loss,
                risk_reward: pos.risk_reward,
                outcome: outcome_name(pos.outcome),
            });
        }
        _ => {}
    }
    item
}

fn zones(projected: &Projected) -> Option<([f64; 4], [f64; 4])> {
    match &projected.shape {
        Some(ScreenShape::Position { profit, loss, .. }) => Some((
            [profit.x0, profit.y0, profit.x1, profit.y1],
            [loss.x0, loss.y0, loss.x1, loss.y1],
        )),
        _ => None,
    }
}

fn outcome_name(outcome: PositionOutcome) -> &'static str {
    match outcome {
        PositionOutcome::NotFilled => "notFilled",
        PositionOutcome::Open => "open",
        PositionOutcome::TargetHit => "targetHit",
        PositionOutcome::StopHit => "stopHit",
    }
}
