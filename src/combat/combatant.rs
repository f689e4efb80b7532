//! Combatant roster entries
//!
//! A combatant is one participant in a session's initiative order:
//! name, initiative score, armor class, hit points, and a list of
//! status effects. All numeric mutations clamp rather than reject.

use serde::{Deserialize, Serialize};

/// A named condition attached to a combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Display name ("Poisoned", "Blessed", ...)
    pub name: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remaining duration in rounds, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    /// Who or what applied the effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StatusEffect {
    /// Create a named effect with no extra detail
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            duration: None,
            source: None,
        }
    }
}

/// Fields accepted when creating a combatant; anything omitted gets
/// the standard defaults (initiative 0, AC 10, HP 1/1).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombatantDraft {
    pub name: String,
    pub initiative: Option<i32>,
    pub armor_class: Option<i32>,
    pub current_hp: Option<i32>,
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
}

/// A participant in a session's combat roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub initiative: i32,
    pub armor_class: i32,
    pub current_hp: i32,
    pub max_hp: i32,
    pub status_effects: Vec<StatusEffect>,
    /// Legacy mirror of "this combatant holds the current turn";
    /// maintained at turn transitions only
    pub is_active: bool,
    pub created_at: String,
}

impl Combatant {
    /// Build a combatant from creation fields, applying defaults.
    ///
    /// When only one of `current_hp`/`max_hp` is supplied the other
    /// follows it, then current HP is clamped into `[0, max_hp]`.
    pub fn from_draft(session_id: &str, draft: CombatantDraft) -> Self {
        let max_hp = draft.max_hp.or(draft.current_hp).unwrap_or(1).max(0);
        let current_hp = draft.current_hp.unwrap_or(max_hp).clamp(0, max_hp);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            name: draft.name,
            initiative: draft.initiative.unwrap_or(0),
            armor_class: draft.armor_class.unwrap_or(10).max(1),
            current_hp,
            max_hp,
            status_effects: draft.status_effects,
            is_active: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Set current HP to an absolute value, clamped to `[0, max_hp]`
    pub fn set_hp(&mut self, value: i32) {
        self.current_hp = value.clamp(0, self.max_hp);
    }

    /// Apply a HP delta (damage negative, healing positive), clamped
    pub fn adjust_hp(&mut self, delta: i32) {
        self.set_hp(self.current_hp.saturating_add(delta));
    }

    /// Change max HP (floor 0) and re-clamp current HP under it
    pub fn set_max_hp(&mut self, value: i32) {
        self.max_hp = value.max(0);
        self.current_hp = self.current_hp.clamp(0, self.max_hp);
    }

    /// Set armor class, floored at 1
    pub fn set_armor_class(&mut self, value: i32) {
        self.armor_class = value.max(1);
    }

    /// Append an effect; insertion order is display order, no dedup
    pub fn add_effect(&mut self, effect: StatusEffect) {
        self.status_effects.push(effect);
    }

    /// Remove the effect at `index`. Out-of-range is a no-op; returns
    /// whether anything was removed.
    pub fn remove_effect(&mut self, index: usize) -> bool {
        if index < self.status_effects.len() {
            self.status_effects.remove(index);
            true
        } else {
            false
        }
    }
}
