use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub account: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let host = state.relay.host();

    Json(HealthResponse {
        status: "ok".to_string(),
        provider: host.provider_id().to_string(),
        account: host.account().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
