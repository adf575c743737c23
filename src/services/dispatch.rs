//! Dispatcher — the synchronization state machine.
//!
//! DESIGN
//! ======
//! Owns the history log, the redo stack, the presence registry and the
//! per-session lifecycle. Each handler validates, mutates state and returns
//! the `Delivery` list describing who must see what. Handlers never send
//! anything themselves; the hub owns fan-out. This keeps every transition
//! testable without sockets or tasks.
//!
//! LIFECYCLE
//! =========
//! `Connecting` (unknown id) → `Active` (after connect) → `Disconnected`
//! (terminal). Only `Active` sessions may act. The most recent
//! `RETIRED_CAPACITY` departed ids are remembered and refused on reconnect;
//! older ones are forgotten. The transport mints a fresh v4 id per socket,
//! so an id that ages out is never presented again in practice.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use uuid::Uuid;

use super::history::HistoryStore;
use super::presence::{Participant, PresenceRegistry};
use super::undo::{UndoManager, UndoOutcome};
use crate::config::UndoSync;
use crate::frame::ErrorCode;
use crate::stroke::{StrokeError, StrokeInput, StrokeSegment};

/// Departed session ids remembered for reuse rejection.
pub const RETIRED_CAPACITY: usize = 4096;

// =============================================================================
// TYPES
// =============================================================================

/// A participant action, already parsed from its wire frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Draw(StrokeInput),
    Undo,
    Redo,
    CursorMove { x: f64, y: f64 },
}

/// Recipients of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only this session.
    Only(Uuid),
    /// Every connected session.
    All,
    /// Every connected session except this one.
    AllExcept(Uuid),
}

impl Audience {
    #[must_use]
    pub fn includes(self, session_id: Uuid) -> bool {
        match self {
            Self::Only(id) => id == session_id,
            Self::All => true,
            Self::AllExcept(id) => id != session_id,
        }
    }
}

/// Live pointer position merged with the mover's display identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorUpdate {
    pub x: f64,
    pub y: f64,
    pub owner_id: Uuid,
    pub name: String,
    pub color: String,
}

/// Outbound event, independent of wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Private greeting carrying the new session's identity.
    Welcome(Participant),
    HistorySnapshot(Vec<StrokeSegment>),
    Draw(StrokeSegment),
    /// Incremental undo: remove exactly this segment.
    Undone { id: Uuid, owner_id: Uuid },
    ClearAll,
    Presence(Vec<Participant>),
    Cursor(CursorUpdate),
    ParticipantLeft(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: Event,
}

impl Delivery {
    fn new(audience: Audience, event: Event) -> Self {
        Self { audience, event }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Disconnected,
}

/// Point-in-time counters for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasStats {
    pub participants: usize,
    pub strokes: usize,
    pub redo_depth: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("session {0} is not connected")]
    NotConnected(Uuid),
    #[error("session id {0} has already been used")]
    SessionReused(Uuid),
    #[error(transparent)]
    Stroke(#[from] StrokeError),
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected(_) => "E_NOT_CONNECTED",
            Self::SessionReused(_) => "E_SESSION_REUSED",
            Self::Stroke(e) => e.error_code(),
        }
    }
}

/// Bounded FIFO set of departed session ids. The oldest is forgotten first.
#[derive(Debug)]
pub struct RetiredIds {
    capacity: usize,
    order: VecDeque<Uuid>,
    members: HashSet<Uuid>,
}

impl RetiredIds {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::new(), members: HashSet::new() }
    }

    pub fn insert(&mut self, session_id: Uuid) {
        if self.capacity == 0 || !self.members.insert(session_id) {
            return;
        }
        self.order.push_back(session_id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    #[must_use]
    pub fn contains(&self, session_id: Uuid) -> bool {
        self.members.contains(&session_id)
    }

    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

pub struct Dispatcher {
    history: HistoryStore,
    undo: UndoManager,
    presence: PresenceRegistry,
    /// Recently disconnected sessions.
    departed: RetiredIds,
    undo_sync: UndoSync,
}

impl Dispatcher {
    #[must_use]
    pub fn new(undo_sync: UndoSync) -> Self {
        Self {
            history: HistoryStore::new(),
            undo: UndoManager::new(),
            presence: PresenceRegistry::new(),
            departed: RetiredIds::new(RETIRED_CAPACITY),
            undo_sync,
        }
    }

    #[must_use]
    pub fn state(&self, session_id: Uuid) -> ConnectionState {
        if self.presence.get(session_id).is_some() {
            ConnectionState::Active
        } else if self.departed.contains(session_id) {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connecting
        }
    }

    #[must_use]
    pub fn stats(&self) -> CanvasStats {
        CanvasStats { participants: self.presence.len(), strokes: self.history.len(), redo_depth: self.undo.depth() }
    }

    /// Admit a new session: greet it, replay history to it, announce presence.
    ///
    /// # Errors
    ///
    /// Returns `SessionReused` if the id was ever seen before.
    pub fn connect(&mut self, session_id: Uuid) -> Result<Vec<Delivery>, DispatchError> {
        if self.state(session_id) != ConnectionState::Connecting {
            return Err(DispatchError::SessionReused(session_id));
        }
        let participant = self.presence.connect(session_id);
        Ok(vec![
            Delivery::new(Audience::Only(session_id), Event::Welcome(participant)),
            Delivery::new(Audience::Only(session_id), Event::HistorySnapshot(self.history.snapshot())),
            Delivery::new(Audience::All, Event::Presence(self.presence.all())),
        ])
    }

    /// Apply one action from an active session.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` for sessions that are not active, or a stroke
    /// error for an invalid draw. State is untouched on error.
    pub fn handle(&mut self, session_id: Uuid, action: Action) -> Result<Vec<Delivery>, DispatchError> {
        if self.state(session_id) != ConnectionState::Active {
            return Err(DispatchError::NotConnected(session_id));
        }
        match action {
            Action::Draw(input) => self.draw(session_id, input),
            Action::Undo => Ok(self.undo(session_id)),
            Action::Redo => Ok(self.redo(session_id)),
            Action::CursorMove { x, y } => Ok(self.cursor(session_id, x, y)),
        }
    }

    /// Remove a session. Silent no-op unless the session is active.
    pub fn disconnect(&mut self, session_id: Uuid) -> Vec<Delivery> {
        if self.presence.disconnect(session_id).is_none() {
            return Vec::new();
        }
        self.departed.insert(session_id);
        vec![
            Delivery::new(Audience::All, Event::Presence(self.presence.all())),
            Delivery::new(Audience::All, Event::ParticipantLeft(session_id)),
        ]
    }

    /// Wipe the canvas for everyone. Pending redos go with it.
    pub fn reset(&mut self) -> Vec<Delivery> {
        self.history.clear();
        self.undo.on_new_draw();
        vec![
            Delivery::new(Audience::All, Event::ClearAll),
            Delivery::new(Audience::All, Event::HistorySnapshot(Vec::new())),
        ]
    }

    fn draw(&mut self, session_id: Uuid, input: StrokeInput) -> Result<Vec<Delivery>, DispatchError> {
        let segment = StrokeSegment::new(session_id, input)?;
        self.history.append(segment.clone());
        self.undo.on_new_draw();
        // The sender already rendered it locally.
        Ok(vec![Delivery::new(Audience::AllExcept(session_id), Event::Draw(segment))])
    }

    fn undo(&mut self, session_id: Uuid) -> Vec<Delivery> {
        let UndoOutcome::Removed(removed) = self.undo.undo(&mut self.history, session_id) else {
            return Vec::new();
        };
        match self.undo_sync {
            UndoSync::Incremental => vec![Delivery::new(
                Audience::All,
                Event::Undone { id: removed.id, owner_id: removed.owner_id },
            )],
            UndoSync::Resync => vec![
                Delivery::new(Audience::All, Event::ClearAll),
                Delivery::new(Audience::All, Event::HistorySnapshot(self.history.snapshot())),
            ],
        }
    }

    fn redo(&mut self, session_id: Uuid) -> Vec<Delivery> {
        let UndoOutcome::Restored(restored) = self.undo.redo(&mut self.history, session_id) else {
            return Vec::new();
        };
        // The sender's copy was removed by the undo, so it gets one too.
        vec![Delivery::new(Audience::All, Event::Draw(restored))]
    }

    fn cursor(&self, session_id: Uuid, x: f64, y: f64) -> Vec<Delivery> {
        let Some(participant) = self.presence.get(session_id) else {
            return Vec::new();
        };
        let update = CursorUpdate {
            x,
            y,
            owner_id: session_id,
            name: participant.name.clone(),
            color: participant.color.clone(),
        };
        vec![Delivery::new(Audience::AllExcept(session_id), Event::Cursor(update))]
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> Vec<StrokeSegment> {
        self.history.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn retired(&self) -> usize {
        self.departed.len()
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
