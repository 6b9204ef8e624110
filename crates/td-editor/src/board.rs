//! The drawing board: every drawing on one chart, plus the bar series they
//! are placed against.
//!
//! All model changes go through [`Board::apply`] as a [`DrawingMutation`].
//! Completed changes are announced as [`CommitEvent`]s, either to a
//! registered callback or, when none is set, into a queue the host drains.

use serde::Serialize;
use td_core::remote::SyncMessage;
use td_core::snapshot::snapshot_all;
use td_core::{BarSeries, Drawing, DrawingId, DrawingSnapshot, LogicalPoint, Points, TdError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitAction {
    Create,
    Update,
    Delete,
}

/// A completed change, ready to persist or send to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEvent {
    pub action: CommitAction,
    pub id: DrawingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Present for create and update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<DrawingSnapshot>,
}

/// A change to the board.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingMutation {
    /// Add a drawing. Commits a create unless it is a preview.
    Insert(Box<Drawing>),
    /// Replace all control points (live, no commit).
    SetPoints { id: DrawingId, points: Points },
    /// Turn a preview into a real drawing and commit its creation.
    Finalize { id: DrawingId },
    /// Remove a drawing. Commits a delete unless it was a preview.
    Remove { id: DrawingId },
}

impl DrawingMutation {
    pub fn id(&self) -> DrawingId {
        match self {
            DrawingMutation::Insert(d) => d.id,
            DrawingMutation::SetPoints { id, .. }
            | DrawingMutation::Finalize { id }
            | DrawingMutation::Remove { id } => *id,
        }
    }
}

type CommitCallback = Box<dyn FnMut(&CommitEvent)>;

pub struct Board {
    drawings: Vec<Drawing>,
    series: BarSeries,
    symbol: Option<String>,
    on_commit: Option<CommitCallback>,
    pending: Vec<CommitEvent>,
}

impl Board {
    pub fn new(series: BarSeries) -> Self {
        Self {
            drawings: Vec::new(),
            series,
            symbol: None,
            on_commit: None,
            pending: Vec::new(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Drawings in paint order (last = topmost).
    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: DrawingId) -> Option<&mut Drawing> {
        self.drawings.iter_mut().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    // ─── Series ──────────────────────────────────────────────────────────

    /// Swap in a new bar series (reload, pagination, timeframe switch).
    ///
    /// Index-only points get a time against the outgoing series first, then
    /// every cached logical index is dropped and geometry is recomputed.
    pub fn replace_series(&mut self, series: BarSeries) {
        for d in &mut self.drawings {
            d.pin_times(&self.series);
        }
        self.series = series;
        for d in &mut self.drawings {
            d.invalidate_coordinate_cache();
            d.recompute_derived_geometry(&self.series);
        }
        log::debug!("series replaced: {} bars, {} drawings", self.series.len(), self.drawings.len());
    }

    // ─── Selection & hover ───────────────────────────────────────────────

    pub fn selected_ids(&self) -> Vec<DrawingId> {
        self.drawings.iter().filter(|d| d.selected).map(|d| d.id).collect()
    }

    /// Select exactly `id`.
    pub fn select_only(&mut self, id: DrawingId) {
        for d in &mut self.drawings {
            d.selected = d.id == id;
        }
    }

    pub fn clear_selection(&mut self) {
        for d in &mut self.drawings {
            d.selected = false;
        }
    }

    /// Mark `id` hovered and everything else not. Returns whether anything
    /// changed.
    pub fn set_hovered(&mut self, id: Option<DrawingId>) -> bool {
        let mut changed = false;
        for d in &mut self.drawings {
            let hovered = Some(d.id) == id;
            changed |= d.hovered != hovered;
            d.hovered = hovered;
        }
        changed
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a mutation, returning the commit it produced, if any.
    pub fn apply(&mut self, mutation: DrawingMutation) -> Option<CommitEvent> {
        match mutation {
            DrawingMutation::Insert(drawing) => {
                let mut drawing = *drawing;
                if self.get(drawing.id).is_some() {
                    log::warn!("{}: already on the board, ignoring insert", drawing.id);
                    return None;
                }
                drawing.recompute_derived_geometry(&self.series);
                let (id, preview) = (drawing.id, drawing.is_preview);
                self.drawings.push(drawing);
                (!preview).then(|| self.commit(CommitAction::Create, id))
            }
            DrawingMutation::SetPoints { id, points } => {
                let series = &self.series;
                match self.drawings.iter_mut().find(|d| d.id == id) {
                    Some(d) => d.set_points(&points, series),
                    None => log::debug!("{id}: set points on missing drawing"),
                }
                None
            }
            DrawingMutation::Finalize { id } => {
                let d = self.get_mut(id)?;
                if !d.is_preview {
                    return None;
                }
                d.is_preview = false;
                Some(self.commit(CommitAction::Create, id))
            }
            DrawingMutation::Remove { id } => {
                let pos = self.drawings.iter().position(|d| d.id == id)?;
                let removed = self.drawings.remove(pos);
                (!removed.is_preview).then(|| self.commit(CommitAction::Delete, id))
            }
        }
    }

    /// Put `id` back into the given state: insert, replace, or remove.
    /// Used by undo/redo; commits whatever change that amounts to.
    pub fn restore(&mut self, id: DrawingId, state: Option<Drawing>) -> Option<CommitEvent> {
        let pos = self.drawings.iter().position(|d| d.id == id);
        match (pos, state) {
            (Some(pos), Some(mut d)) => {
                d.hovered = false;
                d.recompute_derived_geometry(&self.series);
                self.drawings[pos] = d;
                Some(self.commit(CommitAction::Update, id))
            }
            (None, Some(d)) => self.apply(DrawingMutation::Insert(Box::new(d))),
            (Some(_), None) => self.apply(DrawingMutation::Remove { id }),
            (None, None) => None,
        }
    }

    /// Remove every drawing from view without committing deletes, e.g. on a
    /// symbol switch.
    pub fn clear(&mut self) {
        self.drawings.clear();
    }

    // ─── Commits ─────────────────────────────────────────────────────────

    /// Announce a completed change to `id`. Create and update carry a
    /// snapshot of the current state.
    pub fn commit(&mut self, action: CommitAction, id: DrawingId) -> CommitEvent {
        let snapshot = match action {
            CommitAction::Delete => None,
            CommitAction::Create | CommitAction::Update => self.get(id).and_then(|d| match d.snapshot(&self.series) {
                Ok(s) => Some(s),
                Err(e) => {
                    log::warn!("commit without snapshot: {e}");
                    None
                }
            }),
        };
        let event = CommitEvent {
            action,
            id,
            symbol: self.symbol.clone(),
            snapshot,
        };
        log::debug!("commit {:?} {}", event.action, event.id);
        match self.on_commit.as_mut() {
            Some(cb) => cb(&event),
            None => self.pending.push(event.clone()),
        }
        event
    }

    pub fn set_on_commit(&mut self, callback: impl FnMut(&CommitEvent) + 'static) {
        self.on_commit = Some(Box::new(callback));
    }

    /// Commits queued while no callback was registered.
    pub fn drain_commits(&mut self) -> Vec<CommitEvent> {
        std::mem::take(&mut self.pending)
    }

    // ─── Persistence & sync ──────────────────────────────────────────────

    pub fn snapshots(&self) -> Vec<DrawingSnapshot> {
        snapshot_all(&self.drawings, &self.series)
    }

    /// Hydrate persisted drawings, skipping (and logging) any that fail.
    /// Returns how many were loaded. Loading does not commit.
    pub fn load_snapshots(&mut self, snapshots: &[DrawingSnapshot]) -> usize {
        let mut loaded = 0;
        for snap in snapshots {
            match snap.hydrate(&self.series) {
                Ok(d) if self.get(d.id).is_none() => {
                    self.drawings.push(d);
                    loaded += 1;
                }
                Ok(d) => log::warn!("{}: duplicate id in snapshots", d.id),
                Err(e) => log::warn!("skipping snapshot {}: {e}", snap.id),
            }
        }
        loaded
    }

    /// Apply a change pushed by the server. Changes for another symbol are
    /// ignored. Server changes are not committed back.
    pub fn apply_sync(&mut self, message: &SyncMessage) -> Result<Option<DrawingId>, TdError> {
        if let Some(symbol) = &self.symbol
            && symbol != message.symbol()
        {
            log::debug!("ignoring sync for {} on {symbol}", message.symbol());
            return Ok(None);
        }
        match message {
            SyncMessage::Create { drawing, .. } => {
                let d = drawing.into_drawing(None, &self.series)?;
                let id = d.id;
                if self.get(id).is_some() {
                    log::warn!("{id}: server create for an existing drawing");
                    return Ok(None);
                }
                self.drawings.push(d);
                Ok(Some(id))
            }
            SyncMessage::Update { id, drawing, .. } => {
                let fresh = drawing.into_drawing(Some(*id), &self.series)?;
                let Some(existing) = self.get_mut(*id) else {
                    log::warn!("{id}: server update for an unknown drawing");
                    return Ok(None);
                };
                let (selected, hovered) = (existing.selected, existing.hovered);
                *existing = fresh;
                existing.id = *id;
                existing.selected = selected;
                existing.hovered = hovered;
                Ok(Some(*id))
            }
            SyncMessage::Delete { id, .. } => {
                let before = self.drawings.len();
                self.drawings.retain(|d| d.id != *id);
                Ok((self.drawings.len() < before).then_some(*id))
            }
        }
    }

    /// Move every control point of `id` to `points`, keeping derived state
    /// current. Convenience over [`DrawingMutation::SetPoints`].
    pub fn set_points(&mut self, id: DrawingId, points: &[LogicalPoint]) {
        self.apply(DrawingMutation::SetPoints {
            id,
            points: points.iter().copied().collect(),
        });
    }
}
