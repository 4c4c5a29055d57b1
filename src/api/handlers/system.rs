use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use futures::future::join_all;
use serde::Serialize;

use crate::api::AppState;
use crate::redis::RedisPool;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    modes: Vec<String>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let modes = state.modes();
    let checks = modes.iter().filter_map(|mode| state.util(*mode).ok()).map(|util| async move {
        util.executor().pool().check_health().await
    });
    let healthy = join_all(checks).await.into_iter().all(|ok| ok);

    let health_response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        modes: modes.iter().map(|mode| mode.to_string()).collect(),
    };

    Json(health_response)
}
