//! History store — the ordered log of currently-valid stroke segments.
//!
//! DESIGN
//! ======
//! Insertion order is broadcast order. The log grows by `append` on every
//! accepted draw and shrinks only through owner-scoped removal; it is never
//! reordered. Geometry is not checked here; validation happens before a
//! segment exists (see `StrokeSegment::new`).

use uuid::Uuid;

use crate::stroke::StrokeSegment;

#[derive(Debug, Default)]
pub struct HistoryStore {
    segments: Vec<StrokeSegment>,
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment at the end, unconditionally.
    pub fn append(&mut self, segment: StrokeSegment) {
        self.segments.push(segment);
    }

    /// Remove and return the most recent segment owned by `owner_id`.
    ///
    /// Segments by other owners drawn in between are left untouched. Returns
    /// `None` with no side effect if the owner has nothing left.
    pub fn remove_last_by_owner(&mut self, owner_id: Uuid) -> Option<StrokeSegment> {
        let index = self.segments.iter().rposition(|s| s.owner_id == owner_id)?;
        Some(self.segments.remove(index))
    }

    /// Copy of the current log, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StrokeSegment> {
        self.segments.clone()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
