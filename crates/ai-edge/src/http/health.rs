use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health — liveness probe; reports AI Gateway quota state the same
/// way `skynet-gateway`'s handler surfaces provider health.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ai_quota_exhausted": state.gateway.quota_state().is_exhausted(),
        "link_url_publishable": state.config.link_url_is_publishable(),
    }))
}
