//! Undo/redo — owner-scoped removal and restoration over the history log.
//!
//! DESIGN
//! ======
//! The redo stack is shared by all participants, but lookups filter by
//! owner: a participant's redo returns their own most recently undone
//! segment even if others undid something later. Any new draw, by anyone,
//! invalidates the whole stack.

use uuid::Uuid;

use super::history::HistoryStore;
use crate::stroke::StrokeSegment;

/// Result of an undo or redo attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// Undo removed this segment from history.
    Removed(StrokeSegment),
    /// Redo re-appended this segment to history.
    Restored(StrokeSegment),
    /// Nothing applicable for this owner.
    NoOp,
}

#[derive(Debug, Default)]
pub struct UndoManager {
    /// Undone segments, most recent last.
    redo_stack: Vec<StrokeSegment>,
}

impl UndoManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `owner_id`'s most recent segment and push it for redo.
    pub fn undo(&mut self, history: &mut HistoryStore, owner_id: Uuid) -> UndoOutcome {
        let Some(removed) = history.remove_last_by_owner(owner_id) else {
            return UndoOutcome::NoOp;
        };
        self.redo_stack.push(removed.clone());
        UndoOutcome::Removed(removed)
    }

    /// Restore `owner_id`'s most recently undone segment at the end of history.
    pub fn redo(&mut self, history: &mut HistoryStore, owner_id: Uuid) -> UndoOutcome {
        let Some(index) = self.redo_stack.iter().rposition(|s| s.owner_id == owner_id) else {
            return UndoOutcome::NoOp;
        };
        let restored = self.redo_stack.remove(index);
        history.append(restored.clone());
        UndoOutcome::Restored(restored)
    }

    /// Drop every pending redo. Called on each accepted draw.
    pub fn on_new_draw(&mut self) {
        self.redo_stack.clear();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Pending redo entries, oldest undo first.
    #[cfg(test)]
    #[must_use]
    pub fn pending(&self) -> &[StrokeSegment] {
        &self.redo_stack
    }
}

#[cfg(test)]
#[path = "undo_test.rs"]
mod tests;
