//! Session combat state
//!
//! Per-session flags and the turn/round state machine. `current_turn`
//! indexes the initiative-sorted roster view, which is recomputed from
//! the roster at every decision point rather than stored.

use serde::{Deserialize, Serialize};

/// A game session and its combat-tracking state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    /// The session the table is currently playing
    pub is_active: bool,
    pub in_combat: bool,
    /// Starts at 1; increments only when the turn index wraps
    pub current_round: i32,
    /// Index into the initiative-sorted roster
    pub current_turn: i32,
    pub created_at: String,
}

impl Session {
    /// Create a new session, not yet active and not in combat
    pub fn new(name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            is_active: false,
            in_combat: false,
            current_round: 1,
            current_turn: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Enter combat: turn 0, round 1
    pub fn begin_combat(&mut self) {
        self.in_combat = true;
        self.current_turn = 0;
        self.current_round = 1;
    }

    /// Advance to the next turn, wrapping past the roster end into a
    /// new round. Returns the new turn index. `roster_len` must be
    /// non-zero; the caller guards the empty-roster case.
    pub fn advance_turn(&mut self, roster_len: usize) -> usize {
        let next = self.current_turn.saturating_add(1);
        self.current_turn = if next as usize >= roster_len {
            self.current_round += 1;
            0
        } else {
            next
        };
        self.current_turn as usize
    }

    /// Leave combat: turn resets, round count is preserved
    pub fn finish_combat(&mut self) {
        self.in_combat = false;
        self.current_turn = 0;
    }
}
