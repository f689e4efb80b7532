//! Combatant roster API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use super::{error_response, AppState};
use crate::combat::{CombatantDraft, CombatantPatch, StatusEffect};

/// Build the combatants router
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions/{id}/combatants",
            get(list_combatants).post(add_combatant),
        )
        .route(
            "/combatants/{id}",
            delete(remove_combatant).patch(update_combatant),
        )
        .route("/combatants/{id}/effects", post(add_effect))
        .route("/combatants/{id}/effects/{index}", delete(remove_effect))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

/// A session's roster in turn order
async fn list_combatants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.roster(&id).await {
        Ok(roster) => Json(roster).into_response(),
        Err(e) => error_response(e),
    }
}

/// Add a combatant to a session's roster
async fn add_combatant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<CombatantDraft>,
) -> impl IntoResponse {
    match state.engine.add_combatant(&id, draft).await {
        Ok(combatant) => (StatusCode::CREATED, Json(combatant)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Apply a partial update to a combatant
async fn update_combatant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CombatantPatch>,
) -> impl IntoResponse {
    match state.engine.update_combatant(&id, patch).await {
        Ok(combatant) => Json(combatant).into_response(),
        Err(e) => error_response(e),
    }
}

/// Remove a combatant from its roster
async fn remove_combatant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.remove_combatant(&id).await {
        Ok(()) => Json(DeleteResponse { deleted: true }).into_response(),
        Err(e) => error_response(e),
    }
}

/// Append a status effect to a combatant
async fn add_effect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(effect): Json<StatusEffect>,
) -> impl IntoResponse {
    match state.engine.add_status_effect(&id, effect).await {
        Ok(combatant) => Json(combatant).into_response(),
        Err(e) => error_response(e),
    }
}

/// Remove the status effect at an index; out-of-range is a no-op
async fn remove_effect(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> impl IntoResponse {
    match state.engine.remove_status_effect(&id, index).await {
        Ok(combatant) => Json(combatant).into_response(),
        Err(e) => error_response(e),
    }
}
