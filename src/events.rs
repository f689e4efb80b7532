//! Broadcast event taxonomy
//!
//! Every state change fans out to connected viewers as one of these
//! event kinds, serialized as `{"type": ..., "data": ...}`. The wire
//! names are fixed; existing clients dispatch on them.

use serde::Serialize;

use crate::combat::{Combatant, Session};

/// A typed event pushed to every viewer of a session.
///
/// `character_updated` carries an opaque record: character sheets are
/// owned by an outer layer and only relayed through this channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    CharacterUpdated {
        session_id: String,
        character: serde_json::Value,
    },
    CombatantAdded {
        combatant: Combatant,
    },
    CombatantUpdated {
        combatant: Combatant,
    },
    CombatantRemoved {
        session_id: String,
        combatant_id: String,
    },
    CombatStarted {
        session: Session,
        active_combatant: Combatant,
    },
    CombatEnded {
        session: Session,
    },
    TurnChanged {
        session: Session,
        active_combatant: Combatant,
    },
    SessionUpdated {
        session: Session,
    },
    UserJoined {
        session_id: String,
        name: String,
    },
    UserLeft {
        session_id: String,
        name: String,
    },
    DiceRolled {
        session_id: String,
        roller: String,
        notation: String,
        rolls: Vec<u32>,
        total: i32,
    },
}

impl Event {
    /// The wire name of this event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Event::CharacterUpdated { .. } => "character_updated",
            Event::CombatantAdded { .. } => "combatant_added",
            Event::CombatantUpdated { .. } => "combatant_updated",
            Event::CombatantRemoved { .. } => "combatant_removed",
            Event::CombatStarted { .. } => "combat_started",
            Event::CombatEnded { .. } => "combat_ended",
            Event::TurnChanged { .. } => "turn_changed",
            Event::SessionUpdated { .. } => "session_updated",
            Event::UserJoined { .. } => "user_joined",
            Event::UserLeft { .. } => "user_left",
            Event::DiceRolled { .. } => "dice_rolled",
        }
    }
}
