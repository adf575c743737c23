//! Presence registry — who is connected and how they are shown.
//!
//! DESIGN
//! ======
//! A participant's display name is derived from its session id; its color
//! is sampled uniformly from the RGB cube. Collisions are possible and
//! harmless: color is cosmetic and carries no identity.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters of the session id shown in the display name.
const NAME_PREFIX_LEN: usize = 4;

/// A connected participant as shown to everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub session_id: Uuid,
    pub name: String,
    pub color: String,
}

/// `User ab12` for session `ab12…`.
#[must_use]
pub fn display_name(session_id: Uuid) -> String {
    let short: String = session_id.to_string().chars().take(NAME_PREFIX_LEN).collect();
    format!("User {short}")
}

/// Random `#rrggbb` color over the full 24-bit range.
#[must_use]
pub fn random_color() -> String {
    let rgb: u32 = rand::rng().random_range(0..=0x00FF_FFFF);
    format!("#{rgb:06x}")
}

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    participants: HashMap<Uuid, Participant>,
}

impl PresenceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its new identity.
    pub fn connect(&mut self, session_id: Uuid) -> Participant {
        let participant = Participant { session_id, name: display_name(session_id), color: random_color() };
        self.participants.insert(session_id, participant.clone());
        participant
    }

    /// Remove a session. Returns the removed participant, or `None` if absent.
    pub fn disconnect(&mut self, session_id: Uuid) -> Option<Participant> {
        self.participants.remove(&session_id)
    }

    /// Current participants, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, session_id: Uuid) -> Option<&Participant> {
        self.participants.get(&session_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
