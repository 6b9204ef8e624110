//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard events into a unified `InputEvent`
//! enum. Pointer events carry no modifier flags: modifiers are read from
//! [`KeyboardState`], which tracks what is held right now, so pressing a key
//! mid-gesture takes effect without waiting for the next mouse event.

use kurbo::Point;
use td_core::UnixTime;

/// Modifier keys held at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Windows/Linux, ⌘ on macOS: snap to bar values.
    pub fn magnet(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Shift: lock a drag to one axis, or an endpoint to the other's price.
    pub fn constrain(&self) -> bool {
        self.shift
    }
}

/// A normalized input event from the host chart.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `time` is the bar time the host resolved under the
    /// pointer, if any.
    PointerDown {
        x: f64,
        y: f64,
        time: Option<UnixTime>,
    },

    PointerMove {
        x: f64,
        y: f64,
        time: Option<UnixTime>,
    },

    PointerUp {
        x: f64,
        y: f64,
        time: Option<UnixTime>,
    },

    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Escape"`).
    KeyDown { key: String, modifiers: Modifiers },

    KeyUp { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown { x, y, time: None }
    }

    pub fn pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y, time: None }
    }

    pub fn pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y, time: None }
    }

    pub fn key_down(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyDown {
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn key_up(key: &str, modifiers: Modifiers) -> Self {
        Self::KeyUp {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. } | Self::PointerMove { x, y, .. } | Self::PointerUp { x, y, .. } => {
                Some((*x, *y))
            }
            _ => None,
        }
    }

    pub fn known_time(&self) -> Option<UnixTime> {
        match self {
            Self::PointerDown { time, .. } | Self::PointerMove { time, .. } | Self::PointerUp { time, .. } => *time,
            _ => None,
        }
    }
}

/// Where a pointer event happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub time: Option<UnixTime>,
}

impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, time: None }
    }

    pub fn of(event: &InputEvent) -> Option<Self> {
        let (x, y) = event.position()?;
        Some(Self {
            x,
            y,
            time: event.known_time(),
        })
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

// ─── Live keyboard state ─────────────────────────────────────────────────

/// Which modifiers are held right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    held: Modifiers,
}

impl KeyboardState {
    pub fn modifiers(&self) -> Modifiers {
        self.held
    }

    /// Fold a key event into the held state. Returns `true` when any
    /// modifier changed.
    pub fn apply(&mut self, event: &InputEvent) -> bool {
        let (key, mut next, down) = match event {
            InputEvent::KeyDown { key, modifiers } => (key.as_str(), *modifiers, true),
            InputEvent::KeyUp { key, modifiers } => (key.as_str(), *modifiers, false),
            _ => return false,
        };
        // Some hosts report the flag of the key being released as still set.
        match key {
            "Shift" => next.shift = down,
            "Control" => next.ctrl = down,
            "Alt" => next.alt = down,
            "Meta" => next.meta = down,
            _ => {}
        }
        let changed = next != self.held;
        self.held = next;
        changed
    }

    /// Forget everything held, e.g. when the chart loses focus.
    pub fn clear(&mut self) {
        self.held = Modifiers::NONE;
    }
}
