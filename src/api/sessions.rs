//! Session and combat-control API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{error_response, AppState, ErrorResponse};
use crate::combat::{Combatant, Session, SessionPatch};

/// Build the sessions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/active", get(active_session))
        .route("/sessions/{id}", get(get_session).patch(update_session))
        .route("/sessions/{id}/combat/start", post(start_combat))
        .route("/sessions/{id}/combat/turn", post(advance_turn))
        .route("/sessions/{id}/combat/end", post(end_combat))
}

/// Session creation request
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
}

/// Session plus the combatant whose turn it is, returned by the
/// combat-control endpoints
#[derive(Debug, Serialize)]
pub struct CombatStateResponse {
    pub session: Session,
    pub active_combatant: Combatant,
}

/// Create a new session
async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    match state.engine.create_session(&req.name).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Get the session the table is currently playing
async fn active_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.active_session().await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active session".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Get a session by id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.get_session(&id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

/// Rename a session or change its active flag
async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch_req): Json<SessionPatch>,
) -> impl IntoResponse {
    match state.engine.update_session(&id, patch_req).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

/// Start combat for a session
async fn start_combat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.start_combat(&id).await {
        Ok((session, active_combatant)) => Json(CombatStateResponse {
            session,
            active_combatant,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Advance to the next turn
async fn advance_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.advance_turn(&id).await {
        Ok((session, active_combatant)) => Json(CombatStateResponse {
            session,
            active_combatant,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// End combat for a session
async fn end_combat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.end_combat(&id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}
