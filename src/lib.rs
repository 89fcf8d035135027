pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::RelayConfig;
use crate::services::relay_service::RelayService;
use crate::services::staging::StagingArea;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_images,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            services::relay_service::RelayedImage,
            services::relay_service::FailedRelay,
            services::relay_service::RelayOutcome,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "Image relay endpoint"),
        (name = "system", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    pub staging: Arc<StagingArea>,
    pub config: RelayConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/upload",
            post(api::handlers::upload::upload_images)
                .layer(DefaultBodyLimit::max(state.config.body_limit())),
        )
        .fallback_service(api::static_files::spa_service(&state.config.static_dir))
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}

/// CORS restricted to the configured frontend origins, with credentials
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard cannot be combined with credentials
            Ok(value) if value != "*" => Some(value),
            _ => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}
