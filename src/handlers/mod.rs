pub mod docs;
pub mod health;
pub mod process;

pub use docs::*;
pub use health::*;
pub use process::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::logging_middleware;
use crate::AppState;

/// Builds the application router with its middleware stack.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/docs", get(swagger_ui_handler))
        .route("/redoc", get(redoc_handler))
        .route("/openapi.json", get(openapi_handler))
        .route("/process-file/", post(process_file_handler))
        .route("/process-file", post(process_file_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
