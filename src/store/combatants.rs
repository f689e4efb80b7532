//! Combatant persistence and CRUD operations

use anyhow::Result;
use sqlx::SqlitePool;

use crate::combat::{Combatant, StatusEffect};

/// Combatant storage with database backing
pub struct CombatantStore {
    pool: SqlitePool,
}

impl CombatantStore {
    /// Create a new combatant store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new combatant
    pub async fn create(&self, combatant: &Combatant) -> Result<()> {
        let effects = serde_json::to_string(&combatant.status_effects)?;

        sqlx::query(
            r#"
            INSERT INTO combatants
            (id, session_id, name, initiative, armor_class, current_hp, max_hp, status_effects, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&combatant.id)
        .bind(&combatant.session_id)
        .bind(&combatant.name)
        .bind(combatant.initiative)
        .bind(combatant.armor_class)
        .bind(combatant.current_hp)
        .bind(combatant.max_hp)
        .bind(&effects)
        .bind(combatant.is_active)
        .bind(&combatant.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a combatant by ID
    pub async fn get(&self, id: &str) -> Result<Option<Combatant>> {
        let row: Option<CombatantRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, name, initiative, armor_class, current_hp, max_hp, status_effects, is_active, created_at
            FROM combatants WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.into_combatant()?)),
            None => Ok(None),
        }
    }

    /// Update an existing combatant
    pub async fn update(&self, combatant: &Combatant) -> Result<()> {
        let effects = serde_json::to_string(&combatant.status_effects)?;

        sqlx::query(
            r#"
            UPDATE combatants
            SET name = ?, initiative = ?, armor_class = ?, current_hp = ?, max_hp = ?, status_effects = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&combatant.name)
        .bind(combatant.initiative)
        .bind(combatant.armor_class)
        .bind(combatant.current_hp)
        .bind(combatant.max_hp)
        .bind(&effects)
        .bind(combatant.is_active)
        .bind(&combatant.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a combatant
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM combatants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a session's roster in insertion order. Turn order is
    /// derived from this by the caller; it is never stored.
    pub async fn list(&self, session_id: &str) -> Result<Vec<Combatant>> {
        let rows: Vec<CombatantRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, name, initiative, armor_class, current_hp, max_hp, status_effects, is_active, created_at
            FROM combatants WHERE session_id = ? ORDER BY rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_combatant()).collect()
    }

    /// Mirror the active-turn flag: clear it across the session and
    /// set it on the given combatant, if any
    pub async fn set_active_combatant(
        &self,
        session_id: &str,
        active_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE combatants SET is_active = 0 WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if let Some(id) = active_id {
            sqlx::query("UPDATE combatants SET is_active = 1 WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CombatantRow {
    id: String,
    session_id: String,
    name: String,
    initiative: i32,
    armor_class: i32,
    current_hp: i32,
    max_hp: i32,
    status_effects: String,
    is_active: bool,
    created_at: String,
}

impl CombatantRow {
    fn into_combatant(self) -> Result<Combatant> {
        let status_effects: Vec<StatusEffect> = serde_json::from_str(&self.status_effects)?;
        Ok(Combatant {
            id: self.id,
            session_id: self.session_id,
            name: self.name,
            initiative: self.initiative,
            armor_class: self.armor_class,
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            status_effects,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}
