//! Undo/Redo command stack.
//!
//! Commands are per-drawing state snapshots: the drawing as it was before
//! the change and as it was after (`None` = not on the board). Undo puts
//! the `before` state back, redo the `after` state.
//!
//! Drag and resize gestures are batched: the drawing is captured when the
//! gesture starts and again when it ends, so a whole drag is one undo step
//! no matter how many pointer moves it took.

use crate::board::{Board, CommitEvent};
use td_core::{Drawing, DrawingId};

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: DrawingId,
    pub before: Option<Box<Drawing>>,
    pub after: Option<Box<Drawing>>,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Drawing state captured at the start of the open batch.
    batch: Option<(DrawingId, Option<Box<Drawing>>)>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(200)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch: None,
        }
    }

    /// Start a gesture on `id`. A batch already open is replaced.
    pub fn begin_batch(&mut self, board: &Board, id: DrawingId) {
        if let Some((open, _)) = &self.batch {
            log::debug!("batch on {open} replaced by {id}");
        }
        self.batch = Some((id, capture(board, id)));
    }

    /// Close the open batch, recording one command if the drawing changed.
    pub fn end_batch(&mut self, board: &Board, description: &str) -> bool {
        let Some((id, before)) = self.batch.take() else {
            return false;
        };
        let after = capture(board, id);
        if same_state(before.as_deref(), after.as_deref()) {
            return false;
        }
        self.push(Command {
            id,
            before,
            after,
            description: description.to_string(),
        });
        true
    }

    /// Drop the open batch without recording anything.
    pub fn cancel_batch(&mut self) {
        self.batch = None;
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Record a completed change made outside a batch (create, delete).
    pub fn record(&mut self, id: DrawingId, before: Option<Drawing>, after: Option<Drawing>, description: &str) {
        if same_state(before.as_ref(), after.as_ref()) {
            return;
        }
        self.push(Command {
            id,
            before: before.map(|d| Box::new(clean(d))),
            after: after.map(|d| Box::new(clean(d))),
            description: description.to_string(),
        });
    }

    fn push(&mut self, cmd: Command) {
        log::debug!("undo: push '{}' for {}", cmd.description, cmd.id);
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its description and the commit the
    /// board produced for it.
    pub fn undo(&mut self, board: &mut Board) -> Option<(String, Option<CommitEvent>)> {
        let cmd = self.undo_stack.pop()?;
        let event = board.restore(cmd.id, cmd.before.as_deref().cloned());
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some((desc, event))
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, board: &mut Board) -> Option<(String, Option<CommitEvent>)> {
        let cmd = self.redo_stack.pop()?;
        let event = board.restore(cmd.id, cmd.after.as_deref().cloned());
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some((desc, event))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
    }
}

fn capture(board: &Board, id: DrawingId) -> Option<Box<Drawing>> {
    board.get(id).cloned().map(|d| Box::new(clean(d)))
}

/// UI flags are not part of the undoable state.
fn clean(mut d: Drawing) -> Drawing {
    d.hovered = false;
    d.is_preview = false;
    d
}

fn same_state(a: Option<&Drawing>, b: Option<&Drawing>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.kind == b.kind && a.points() == b.points() && a.options == b.options,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CommitAction, DrawingMutation};
    use pretty_assertions::assert_eq;
    use td_core::{BarSeries, DrawingKind, DrawingOptions, LogicalPoint};

    const HOUR: i64 = 3600;

    fn board() -> Board {
        let rows: Vec<_> = (0..30).map(|_| (100.0, 101.0, 99.0, 100.0)).collect();
        Board::new(BarSeries::from_ohlc(0, HOUR, &rows))
    }

    fn insert_box(board: &mut Board, name: &str) -> DrawingId {
        let d = Drawing::new(
            DrawingId::intern(name),
            DrawingKind::Box,
            [LogicalPoint::new(HOUR, 100.0), LogicalPoint::new(5 * HOUR, 110.0)],
            DrawingOptions::default(),
            board.series(),
        )
        .unwrap();
        let id = d.id;
        board.apply(DrawingMutation::Insert(Box::new(d)));
        id
    }

    #[test]
    fn batch_is_one_step() {
        let mut board = board();
        let mut stack = CommandStack::new(10);
        let id = insert_box(&mut board, "cmd-batch");
        let original = board.get(id).unwrap().points().to_vec();

        stack.begin_batch(&board, id);
        for dx in 1..=3 {
            let moved: Vec<_> = original
                .iter()
                .map(|p| LogicalPoint::new(p.time.unwrap() + dx * HOUR, p.price))
                .collect();
            board.set_points(id, &moved);
        }
        assert!(stack.end_batch(&board, "move"));
        assert_eq!(board.get(id).unwrap().points()[0].time, Some(4 * HOUR));

        let (desc, event) = stack.undo(&mut board).unwrap();
        assert_eq!(desc, "move");
        assert_eq!(event.unwrap().action, CommitAction::Update);
        assert_eq!(board.get(id).unwrap().points(), original.as_slice());

        stack.redo(&mut board).unwrap();
        assert_eq!(board.get(id).unwrap().points()[0].time, Some(4 * HOUR));
        assert!(!stack.can_redo());
    }

    #[test]
    fn unchanged_batch_records_nothing() {
        let mut board = board();
        let mut stack = CommandStack::new(10);
        let id = insert_box(&mut board, "cmd-noop");
        stack.begin_batch(&board, id);
        board.select_only(id);
        assert!(!stack.end_batch(&board, "move"));
        assert!(!stack.can_undo());
    }

    #[test]
    fn undo_delete_restores_drawing() {
        let mut board = board();
        let mut stack = CommandStack::new(10);
        let id = insert_box(&mut board, "cmd-delete");
        let before = board.get(id).cloned();
        board.apply(DrawingMutation::Remove { id });
        stack.record(id, before, None, "delete");

        let (_, event) = stack.undo(&mut board).unwrap();
        assert_eq!(event.unwrap().action, CommitAction::Create);
        assert!(board.get(id).is_some());

        let (_, event) = stack.redo(&mut board).unwrap();
        assert_eq!(event.unwrap().action, CommitAction::Delete);
        assert!(board.get(id).is_none());
    }

    #[test]
    fn depth_is_bounded() {
        let mut board = board();
        let mut stack = CommandStack::new(2);
        for name in ["cmd-d1", "cmd-d2", "cmd-d3"] {
            let id = insert_box(&mut board, name);
            stack.record(id, None, board.get(id).cloned(), "create");
        }
        assert!(stack.undo(&mut board).is_some());
        assert!(stack.undo(&mut board).is_some());
        assert!(stack.undo(&mut board).is_none());
        assert!(board.get(DrawingId::intern("cmd-d1")).is_some());
    }

    #[test]
    fn new_command_clears_redo() {
        let mut board = board();
        let mut stack = CommandStack::new(10);
        let a = insert_box(&mut board, "cmd-r1");
        stack.record(a, None, board.get(a).cloned(), "create");
        stack.undo(&mut board);
        assert!(stack.can_redo());
        let b = insert_box(&mut board, "cmd-r2");
        stack.record(b, None, board.get(b).cloned(), "create");
        assert!(!stack.can_redo());
    }
}
