//! Health, liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::network::HealthState;

/// Always 200; the body's `state` says whether the server is serving.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "state": state.shutdown.health_state().as_str(),
        "in_flight": state.shutdown.in_flight_count(),
        "cache": state.books.cache_name(),
        "user_service": state.users.is_some(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// 200 while the process can answer at all.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// 200 only in the `Ready` state.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    if state.shutdown.health_state() == HealthState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
