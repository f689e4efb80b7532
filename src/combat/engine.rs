//! Combat engine
//!
//! The service layer behind every roster and turn-order operation.
//! Reads and writes go through the persistence stores; every state
//! change fans out on the broadcast channel. Combat-control
//! operations (start/advance/end) serialize on a per-session lock so
//! concurrent calls cannot interleave their read-modify-write cycles.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::broadcast::ConnectionManager;
use crate::events::Event;
use crate::store::{CombatantStore, SessionStore};

use super::combatant::{Combatant, CombatantDraft, StatusEffect};
use super::dice::{DiceError, DiceExpr, RollOutcome};
use super::order;
use super::session::Session;

/// Combat operation errors
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("session not found")]
    SessionNotFound,

    #[error("combatant not found")]
    CombatantNotFound,

    #[error("combat requires at least one combatant")]
    EmptyRoster,

    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Partial update for a combatant; omitted fields are left alone.
/// `current_hp` is an absolute write, `hp_delta` a relative one;
/// both clamp into `[0, max_hp]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombatantPatch {
    pub name: Option<String>,
    pub initiative: Option<i32>,
    pub armor_class: Option<i32>,
    pub max_hp: Option<i32>,
    pub current_hp: Option<i32>,
    pub hp_delta: Option<i32>,
}

/// Partial update for a session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Turn-order engine and roster service for all sessions
pub struct CombatEngine {
    sessions: Arc<SessionStore>,
    combatants: Arc<CombatantStore>,
    connections: Arc<ConnectionManager>,
    /// Per-session combat-control locks, created on first use
    combat_locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CombatEngine {
    /// Create a new engine over the given stores and broadcast channel
    pub fn new(
        sessions: Arc<SessionStore>,
        combatants: Arc<CombatantStore>,
        connections: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            sessions,
            combatants,
            connections,
            combat_locks: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    fn combat_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.combat_locks
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Create a session. The first session created becomes the active
    /// one; later sessions are activated explicitly.
    pub async fn create_session(&self, name: &str) -> Result<Session, CombatError> {
        if name.trim().is_empty() {
            return Err(CombatError::EmptyName);
        }

        let mut session = Session::new(name);
        if self.sessions.get_active().await?.is_none() {
            session.is_active = true;
        }
        self.sessions.create(&session).await?;

        info!(session = %session.id, name = %session.name, "session created");
        Ok(session)
    }

    /// Look up a session by id
    pub async fn get_session(&self, id: &str) -> Result<Session, CombatError> {
        self.sessions
            .get(id)
            .await?
            .ok_or(CombatError::SessionNotFound)
    }

    /// The session the table is currently playing, if any
    pub async fn active_session(&self) -> Result<Option<Session>, CombatError> {
        Ok(self.sessions.get_active().await?)
    }

    /// Apply a partial session update and notify viewers
    pub async fn update_session(
        &self,
        id: &str,
        patch: SessionPatch,
    ) -> Result<Session, CombatError> {
        let mut session = self.get_session(id).await?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CombatError::EmptyName);
            }
            session.name = name;
        }
        if let Some(active) = patch.is_active {
            session.is_active = active;
        }
        self.sessions.update(&session).await?;
        if session.is_active {
            self.sessions.set_active(&session.id).await?;
        }

        self.connections
            .broadcast(
                &session.id,
                Event::SessionUpdated {
                    session: session.clone(),
                },
            )
            .await;
        Ok(session)
    }

    /// A session's roster in turn order (initiative descending,
    /// insertion order among ties). Recomputed on every call.
    pub async fn roster(&self, session_id: &str) -> Result<Vec<Combatant>, CombatError> {
        self.get_session(session_id).await?;
        let roster = self.combatants.list(session_id).await?;
        Ok(order::initiative_order(roster))
    }

    /// Add a combatant to a session's roster
    pub async fn add_combatant(
        &self,
        session_id: &str,
        draft: CombatantDraft,
    ) -> Result<Combatant, CombatError> {
        self.get_session(session_id).await?;
        if draft.name.trim().is_empty() {
            return Err(CombatError::EmptyName);
        }

        let combatant = Combatant::from_draft(session_id, draft);
        self.combatants.create(&combatant).await?;

        debug!(
            session = %session_id,
            combatant = %combatant.id,
            name = %combatant.name,
            "combatant added"
        );
        self.connections
            .broadcast(
                session_id,
                Event::CombatantAdded {
                    combatant: combatant.clone(),
                },
            )
            .await;
        Ok(combatant)
    }

    /// Apply a partial combatant update; numeric writes clamp rather
    /// than reject
    pub async fn update_combatant(
        &self,
        id: &str,
        patch: CombatantPatch,
    ) -> Result<Combatant, CombatError> {
        let mut combatant = self
            .combatants
            .get(id)
            .await?
            .ok_or(CombatError::CombatantNotFound)?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(CombatError::EmptyName);
            }
            combatant.name = name;
        }
        if let Some(initiative) = patch.initiative {
            combatant.initiative = initiative;
        }
        if let Some(ac) = patch.armor_class {
            combatant.set_armor_class(ac);
        }
        if let Some(max) = patch.max_hp {
            combatant.set_max_hp(max);
        }
        if let Some(hp) = patch.current_hp {
            combatant.set_hp(hp);
        }
        if let Some(delta) = patch.hp_delta {
            combatant.adjust_hp(delta);
        }

        self.combatants.update(&combatant).await?;
        self.broadcast_combatant_updated(&combatant).await;
        Ok(combatant)
    }

    /// Append a status effect
    pub async fn add_status_effect(
        &self,
        id: &str,
        effect: StatusEffect,
    ) -> Result<Combatant, CombatError> {
        let mut combatant = self
            .combatants
            .get(id)
            .await?
            .ok_or(CombatError::CombatantNotFound)?;

        combatant.add_effect(effect);
        self.combatants.update(&combatant).await?;
        self.broadcast_combatant_updated(&combatant).await;
        Ok(combatant)
    }

    /// Remove the status effect at `index`; out-of-range is a no-op
    pub async fn remove_status_effect(
        &self,
        id: &str,
        index: usize,
    ) -> Result<Combatant, CombatError> {
        let mut combatant = self
            .combatants
            .get(id)
            .await?
            .ok_or(CombatError::CombatantNotFound)?;

        combatant.remove_effect(index);
        self.combatants.update(&combatant).await?;
        self.broadcast_combatant_updated(&combatant).await;
        Ok(combatant)
    }

    /// Delete a combatant from its roster.
    ///
    /// The session's turn index is left alone: deleting ahead of the
    /// active slot shifts which combatant the index lands on.
    pub async fn remove_combatant(&self, id: &str) -> Result<(), CombatError> {
        let combatant = self
            .combatants
            .get(id)
            .await?
            .ok_or(CombatError::CombatantNotFound)?;

        self.combatants.delete(id).await?;
        debug!(combatant = %id, name = %combatant.name, "combatant removed");
        self.connections
            .broadcast(
                &combatant.session_id,
                Event::CombatantRemoved {
                    session_id: combatant.session_id.clone(),
                    combatant_id: combatant.id,
                },
            )
            .await;
        Ok(())
    }

    /// Start combat: turn 0, round 1. Requires a non-empty roster.
    pub async fn start_combat(
        &self,
        session_id: &str,
    ) -> Result<(Session, Combatant), CombatError> {
        let lock = self.combat_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self.get_session(session_id).await?;
        let roster = self.combatants.list(session_id).await?;
        if roster.is_empty() {
            return Err(CombatError::EmptyRoster);
        }

        session.begin_combat();
        self.sessions.update(&session).await?;

        let ordered = order::initiative_order(roster);
        let mut active = order::active_combatant(&ordered, session.current_turn)
            .cloned()
            .ok_or(CombatError::EmptyRoster)?;
        self.combatants
            .set_active_combatant(session_id, Some(&active.id))
            .await?;
        active.is_active = true;

        info!(session = %session_id, active = %active.name, "combat started");
        self.connections
            .broadcast(
                session_id,
                Event::CombatStarted {
                    session: session.clone(),
                    active_combatant: active.clone(),
                },
            )
            .await;
        Ok((session, active))
    }

    /// Advance to the next turn, wrapping into a new round at the end
    /// of the order. The order is recomputed from the live roster, so
    /// initiative edits and additions between turns take effect here.
    pub async fn advance_turn(
        &self,
        session_id: &str,
    ) -> Result<(Session, Combatant), CombatError> {
        let lock = self.combat_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self.get_session(session_id).await?;
        let roster = self.combatants.list(session_id).await?;
        if roster.is_empty() {
            return Err(CombatError::EmptyRoster);
        }

        let ordered = order::initiative_order(roster);
        session.advance_turn(ordered.len());
        self.sessions.update(&session).await?;

        let mut active = order::active_combatant(&ordered, session.current_turn)
            .cloned()
            .ok_or(CombatError::EmptyRoster)?;
        self.combatants
            .set_active_combatant(session_id, Some(&active.id))
            .await?;
        active.is_active = true;

        debug!(
            session = %session_id,
            turn = session.current_turn,
            round = session.current_round,
            active = %active.name,
            "turn advanced"
        );
        self.connections
            .broadcast(
                session_id,
                Event::TurnChanged {
                    session: session.clone(),
                    active_combatant: active.clone(),
                },
            )
            .await;
        Ok((session, active))
    }

    /// End combat: flags off, turn reset, round count preserved
    pub async fn end_combat(&self, session_id: &str) -> Result<Session, CombatError> {
        let lock = self.combat_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = self.get_session(session_id).await?;
        session.finish_combat();
        self.sessions.update(&session).await?;
        self.combatants
            .set_active_combatant(session_id, None)
            .await?;

        info!(session = %session_id, rounds = session.current_round, "combat ended");
        self.connections
            .broadcast(
                session_id,
                Event::CombatEnded {
                    session: session.clone(),
                },
            )
            .await;
        Ok(session)
    }

    /// Roll dice for a viewer and announce the result to the session
    pub async fn roll_dice(
        &self,
        session_id: &str,
        roller: &str,
        notation: &str,
    ) -> Result<RollOutcome, CombatError> {
        self.get_session(session_id).await?;

        let expr: DiceExpr = notation.parse()?;
        let outcome = expr.roll();

        self.connections
            .broadcast(
                session_id,
                Event::DiceRolled {
                    session_id: session_id.to_string(),
                    roller: roller.to_string(),
                    notation: expr.to_string(),
                    rolls: outcome.rolls.clone(),
                    total: outcome.total,
                },
            )
            .await;
        Ok(outcome)
    }

    /// Relay a character-sheet change from the outer layer to every
    /// viewer of the session. Character data is opaque to the core.
    pub async fn notify_character_updated(
        &self,
        session_id: &str,
        character: serde_json::Value,
    ) -> Result<(), CombatError> {
        self.get_session(session_id).await?;

        self.connections
            .broadcast(
                session_id,
                Event::CharacterUpdated {
                    session_id: session_id.to_string(),
                    character,
                },
            )
            .await;
        Ok(())
    }

    async fn broadcast_combatant_updated(&self, combatant: &Combatant) {
        self.connections
            .broadcast(
                &combatant.session_id,
                Event::CombatantUpdated {
                    combatant: combatant.clone(),
                },
            )
            .await;
    }
}
