//! Combat tracking module
//!
//! Implements initiative-tracker combat for tabletop sessions:
//! - Combatant roster with HP, AC, and status effects
//! - Stable initiative ordering (highest acts first)
//! - Turn/round state machine per session
//! - Dice rolling (e.g., "2d6+3")
//! - The engine tying roster, turn order, storage, and broadcast together

mod combatant;
mod dice;
mod engine;
mod order;
mod session;

pub use combatant::{Combatant, CombatantDraft, StatusEffect};
pub use dice::{DiceError, DiceExpr, RollOutcome};
pub use engine::{CombatEngine, CombatError, CombatantPatch, SessionPatch};
pub use order::{active_combatant, initiative_order};
pub use session::Session;
