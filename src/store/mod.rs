//! Persistence gateway
//!
//! One store per record type over the shared SQLite pool. The combat
//! engine only talks to storage through these.

mod combatants;
mod sessions;

pub use combatants::CombatantStore;
pub use sessions::SessionStore;
