//! HTTP shell for the Rufus agent service.

pub mod config;
pub mod routes;
pub mod schema;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use routes::AppState;
use std::path::Path;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

/// Builds the application router: API routes, CORS for the configured
/// frontend origins, and static product images under `/images`.
pub fn build_router(state: AppState, allowed_origins: &[String], images_dir: &Path) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(routes::read_root))
        .route("/api/agent/start_session", post(routes::start_session))
        .route("/api/agent/chat", post(routes::chat_with_agent))
        .route("/api/agent/recommend-text", post(routes::recommend_text))
        .route("/api/agent/recommend-image", post(routes::recommend_image))
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(cors)
        .with_state(state)
}
