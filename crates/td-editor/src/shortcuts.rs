//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Bare modifier
//! presses never resolve; the router feeds them to the live keyboard state
//! instead.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolLine,
    ToolBox,
    ToolFib,
    ToolRuler,
    ToolLong,
    ToolShort,

    // ── Edit ──
    Undo,
    Redo,
    Delete,

    /// Discard a drawing in progress, or clear the selection.
    Cancel,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.ctrl || modifiers.meta;

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if modifiers.alt {
            return match key {
                "t" | "T" => Some(ShortcutAction::ToolLine),
                "f" | "F" => Some(ShortcutAction::ToolFib),
                _ => None,
            };
        }

        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "r" | "R" => Some(ShortcutAction::ToolBox),
            "m" | "M" => Some(ShortcutAction::ToolRuler),
            "b" | "B" => Some(ShortcutAction::ToolLong),
            "s" | "S" => Some(ShortcutAction::ToolShort),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
