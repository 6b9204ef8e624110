//! Pointer travel threshold.
//!
//! A gesture only becomes a drag once the pointer has travelled a few
//! pixels from where it went down. The same latch decides when handles hide
//! and when a resized handle may take a new name.

use kurbo::Point;

pub const DEFAULT_THRESHOLD_PX: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementThreshold {
    origin: Point,
    distance: f64,
    passed: bool,
}

impl MovementThreshold {
    pub fn new(origin: Point, distance: f64) -> Self {
        Self {
            origin,
            distance: distance.max(0.0),
            passed: false,
        }
    }

    /// Feed the current pointer position. Once passed, stays passed even if
    /// the pointer returns to the origin.
    pub fn update(&mut self, p: Point) -> bool {
        if !self.passed && p.distance(self.origin) > self.distance {
            self.passed = true;
        }
        self.passed
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn origin(&self) -> Point {
        self.origin
    }
}
