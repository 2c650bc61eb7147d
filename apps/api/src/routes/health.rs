use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE_NAME: &str = "estimate-auditor";

/// GET /
/// Static liveness answer for platform health checks.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "active",
        "service": SERVICE_NAME
    }))
}

/// GET /health
/// Returns a simple status object with service version and the resolved model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME,
        "model": state.gateway.model()
    }))
}
