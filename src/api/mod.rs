//! HTTP API module - REST endpoints and WebSocket

mod combatants;
mod sessions;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::broadcast::ConnectionManager;
use crate::combat::{CombatEngine, CombatError};
use crate::db::Database;
use crate::store::{CombatantStore, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub engine: Arc<CombatEngine>,
    pub connections: Arc<ConnectionManager>,
}

/// Build the API router
pub fn router(db: Arc<Database>) -> Router {
    let connections = Arc::new(ConnectionManager::new());
    let sessions = Arc::new(SessionStore::new(db.pool().clone()));
    let combatants = Arc::new(CombatantStore::new(db.pool().clone()));
    let engine = Arc::new(CombatEngine::new(
        sessions,
        combatants,
        connections.clone(),
    ));

    let state = AppState {
        db,
        engine,
        connections,
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/ws", get(websocket::ws_handler))
        .merge(sessions::router())
        .merge(combatants::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error response body shared by every handler
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a combat error onto an HTTP response
pub(crate) fn error_response(err: CombatError) -> Response {
    let status = match &err {
        CombatError::EmptyName | CombatError::Dice(_) => StatusCode::BAD_REQUEST,
        CombatError::SessionNotFound | CombatError::CombatantNotFound => StatusCode::NOT_FOUND,
        CombatError::EmptyRoster => StatusCode::CONFLICT,
        CombatError::Storage(e) => {
            error!("storage error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "tabletopd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
