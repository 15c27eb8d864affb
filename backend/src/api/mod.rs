pub mod auth;
pub mod shifts;

use axum::{routing::{get, patch, post}, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // Shifts
        .route("/api/shifts", get(shifts::list).post(shifts::create))
        .route(
            "/api/shifts/:id",
            get(shifts::get_one).put(shifts::update).delete(shifts::delete),
        )
        .route("/api/shifts/:id/status", patch(shifts::update_status))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
