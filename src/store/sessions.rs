//! Session persistence and CRUD operations

use anyhow::Result;
use sqlx::SqlitePool;

use crate::combat::Session;

/// Session storage with database backing
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Create a new session store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new session
    pub async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, name, is_active, in_combat, current_round, current_turn, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.name)
        .bind(session.is_active)
        .bind(session.in_combat)
        .bind(session.current_round)
        .bind(session.current_turn)
        .bind(&session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a session by ID
    pub async fn get(&self, id: &str) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, name, is_active, in_combat, current_round, current_turn, created_at
            FROM sessions WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    /// Get the session the table is currently playing, if any
    pub async fn get_active(&self) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, name, is_active, in_combat, current_round, current_turn, created_at
            FROM sessions WHERE is_active = 1 LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    /// Update an existing session
    pub async fn update(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET name = ?, is_active = ?, in_combat = ?, current_round = ?, current_turn = ?
            WHERE id = ?
            "#,
        )
        .bind(&session.name)
        .bind(session.is_active)
        .bind(session.in_combat)
        .bind(session.current_round)
        .bind(session.current_turn)
        .bind(&session.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark one session active and clear the flag everywhere else
    pub async fn set_active(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET is_active = 0 WHERE id != ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE sessions SET is_active = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    name: String,
    is_active: bool,
    in_combat: bool,
    current_round: i32,
    current_turn: i32,
    created_at: String,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: self.id,
            name: self.name,
            is_active: self.is_active,
            in_combat: self.in_combat,
            current_round: self.current_round,
            current_turn: self.current_turn,
            created_at: self.created_at,
        }
    }
}
