//! Liveness and root banner handlers

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use registry_core::repositories::UserRepository;

use crate::state::AppState;

/// Liveness probe. Deliberately does not touch the store.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn root<R: UserRepository>(State(state): State<AppState<R>>) -> Json<Value> {
    Json(json!({
        "message": state.config.app.name,
        "version": state.config.app.version,
    }))
}
