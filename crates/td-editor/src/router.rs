//! Input router: the single entry point for pointer and keyboard events.
//!
//! Owns the board, the live keyboard state, the active creation tool, the
//! interaction controller and the undo stack, and decides which of them a
//! given event belongs to.

use crate::board::{Board, CommitAction, CommitEvent, DrawingMutation};
use crate::commands::CommandStack;
use crate::config::InteractionConfig;
use crate::controller::{GestureMode, InteractionController};
use crate::input::{InputEvent, KeyboardState, Pointer};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{Tool, ToolContext, ToolKind, tool_for};
use td_core::{BarSeries, ChartViewport, DrawingId};
use td_hit::Cursor;
use td_hit::handles::Handles;

pub struct InputRouter {
    board: Board,
    controller: InteractionController,
    keyboard: KeyboardState,
    tool: Option<Box<dyn Tool>>,
    commands: CommandStack,
    config: InteractionConfig,
}

impl InputRouter {
    pub fn new(board: Board, config: InteractionConfig) -> Self {
        Self {
            board,
            controller: InteractionController::new(),
            keyboard: KeyboardState::default(),
            tool: None,
            commands: CommandStack::new(config.undo_depth),
            config,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.as_ref().map_or(ToolKind::Select, |t| t.kind())
    }

    /// Switch tools. A drawing still being placed is discarded.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.cancel_tool();
        self.tool = tool_for(kind);
        if self.tool.is_some() {
            self.board.clear_selection();
        }
        log::debug!("tool: {kind:?}");
    }

    /// Route one event. Returns `true` when the host should redraw.
    pub fn handle(&mut self, event: &InputEvent, viewport: &dyn ChartViewport) -> bool {
        match event {
            InputEvent::KeyDown { key, modifiers } => {
                let replayed = self.keyboard.apply(event) && self.replay(viewport);
                match ShortcutMap::resolve(key, *modifiers) {
                    Some(action) => self.run_action(action) || replayed,
                    None => replayed,
                }
            }
            InputEvent::KeyUp { .. } => self.keyboard.apply(event) && self.replay(viewport),
            _ => {
                let Some(pointer) = Pointer::of(event) else {
                    return false;
                };
                if self.tool.is_some() {
                    self.route_to_tool(event, viewport)
                } else {
                    self.route_to_controller(event, pointer, viewport)
                }
            }
        }
    }

    fn route_to_tool(&mut self, event: &InputEvent, viewport: &dyn ChartViewport) -> bool {
        let Some(tool) = self.tool.as_mut() else {
            return false;
        };
        let ctx = ToolContext {
            viewport,
            series: self.board.series(),
            modifiers: self.keyboard.modifiers(),
            config: &self.config,
        };
        let mutations = tool.handle(event, &ctx);
        let done = tool.is_done();
        let changed = self.apply_all(mutations);
        if done {
            self.tool = None;
        }
        changed
    }

    fn route_to_controller(&mut self, event: &InputEvent, pointer: Pointer, viewport: &dyn ChartViewport) -> bool {
        let modifiers = self.keyboard.modifiers();
        match event {
            InputEvent::PointerDown { .. } => {
                let had_selection = !self.board.selected_ids().is_empty();
                match self.controller.pointer_down(&mut self.board, viewport, pointer, &self.config) {
                    Some(id) => {
                        self.commands.begin_batch(&self.board, id);
                        true
                    }
                    None => had_selection,
                }
            }
            InputEvent::PointerMove { .. } => {
                self.controller
                    .pointer_move(&mut self.board, viewport, pointer, modifiers, &self.config)
            }
            InputEvent::PointerUp { .. } => {
                let Some(end) = self.controller.pointer_up(&mut self.board, viewport, pointer, modifiers) else {
                    return false;
                };
                if end.committed.is_some() {
                    let description = match end.mode {
                        GestureMode::Dragging => "move",
                        GestureMode::Resizing => "resize",
                    };
                    self.commands.end_batch(&self.board, description);
                } else {
                    self.commands.cancel_batch();
                }
                true
            }
            _ => false,
        }
    }

    /// Re-run the last pointer position after a modifier change.
    fn replay(&mut self, viewport: &dyn ChartViewport) -> bool {
        if let Some(tool) = self.tool.as_mut() {
            let ctx = ToolContext {
                viewport,
                series: self.board.series(),
                modifiers: self.keyboard.modifiers(),
                config: &self.config,
            };
            let mutations = tool.replay(&ctx);
            return self.apply_all(mutations);
        }
        let modifiers = self.keyboard.modifiers();
        self.controller.replay(&mut self.board, viewport, modifiers)
    }

    fn run_action(&mut self, action: ShortcutAction) -> bool {
        match action {
            ShortcutAction::ToolSelect => self.switch(ToolKind::Select),
            ShortcutAction::ToolLine => self.switch(ToolKind::Line),
            ShortcutAction::ToolBox => self.switch(ToolKind::Box),
            ShortcutAction::ToolFib => self.switch(ToolKind::Fib),
            ShortcutAction::ToolRuler => self.switch(ToolKind::Ruler),
            ShortcutAction::ToolLong => self.switch(ToolKind::LongPosition),
            ShortcutAction::ToolShort => self.switch(ToolKind::ShortPosition),
            ShortcutAction::Undo => self.undo().is_some(),
            ShortcutAction::Redo => self.redo().is_some(),
            ShortcutAction::Delete => !self.delete_selection().is_empty(),
            ShortcutAction::Cancel => self.cancel(),
        }
    }

    fn switch(&mut self, kind: ToolKind) -> bool {
        if self.controller.is_active() {
            return false;
        }
        self.set_tool(kind);
        true
    }

    /// Escape. Discards a drawing being placed (and returns to selection);
    /// an in-progress drag or resize is left alone; otherwise clears the
    /// selection.
    pub fn cancel(&mut self) -> bool {
        if self.tool.as_ref().is_some_and(|t| t.in_progress()) {
            self.cancel_tool();
            self.tool = None;
            return true;
        }
        if self.controller.is_active() {
            log::debug!("escape during a gesture is ignored");
            return false;
        }
        if self.tool.take().is_some() {
            return true;
        }
        let had_selection = !self.board.selected_ids().is_empty();
        self.board.clear_selection();
        had_selection
    }

    fn cancel_tool(&mut self) {
        if let Some(tool) = self.tool.as_mut() {
            let mutations = tool.cancel();
            self.apply_all(mutations);
        }
    }

    /// Delete every selected drawing, each as its own undo step.
    pub fn delete_selection(&mut self) -> Vec<CommitEvent> {
        if self.controller.is_active() {
            return Vec::new();
        }
        let mut events = Vec::new();
        for id in self.board.selected_ids() {
            let before = self.board.get(id).cloned();
            if let Some(event) = self.board.apply(DrawingMutation::Remove { id }) {
                self.commands.record(id, before, None, "delete");
                events.push(event);
            }
        }
        events
    }

    pub fn undo(&mut self) -> Option<String> {
        if self.controller.is_active() || self.tool.as_ref().is_some_and(|t| t.in_progress()) {
            return None;
        }
        self.commands.undo(&mut self.board).map(|(desc, _)| desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        if self.controller.is_active() || self.tool.as_ref().is_some_and(|t| t.in_progress()) {
            return None;
        }
        self.commands.redo(&mut self.board).map(|(desc, _)| desc)
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Apply tool mutations, recording finished creations for undo.
    fn apply_all(&mut self, mutations: Vec<DrawingMutation>) -> bool {
        let changed = !mutations.is_empty();
        for m in mutations {
            if let Some(event) = self.board.apply(m)
                && event.action == CommitAction::Create
            {
                self.board.select_only(event.id);
                let created = self.board.get(event.id).cloned();
                self.commands.record(event.id, None, created, "create");
            }
        }
        changed
    }

    // ─── Host lifecycle ──────────────────────────────────────────────────

    /// Tear down for a chart context switch: drop any gesture and drawing in
    /// progress, the cursor override and held keys.
    pub fn detach(&mut self) {
        self.cancel_tool();
        self.tool = None;
        self.controller.detach();
        self.commands.cancel_batch();
        self.keyboard.clear();
        self.board.set_hovered(None);
    }

    pub fn replace_series(&mut self, series: BarSeries) {
        self.controller.rebase(self.board.series());
        if let Some(tool) = self.tool.as_mut() {
            tool.rebase(self.board.series());
        }
        self.board.replace_series(series);
    }

    pub fn cursor(&self) -> Cursor {
        match &self.tool {
            Some(_) => Cursor::Crosshair,
            None => self.controller.cursor(),
        }
    }

    pub fn handles(&self, viewport: &dyn ChartViewport) -> Vec<(DrawingId, Handles)> {
        self.controller.visible_handles(&self.board, viewport)
    }
}
