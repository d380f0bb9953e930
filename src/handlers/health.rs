use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use crate::models::{HealthResponse, ToolAvailability};
use crate::AppState;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

const SERVICE_NAME: &str = "unified-extract";

/// Pins the uptime origin. Called once at startup.
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

/// `GET /`
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "File extraction API is running. POST a base64 file to /process-file/ or see /docs."
    }))
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let pdf_rasterizer = state.dispatcher.rasterizer().is_available().await;
    let ocr_enabled = state.dispatcher.ocr_enabled();

    let status = if pdf_rasterizer { "healthy" } else { "degraded" };
    info!(status = status, pdf_rasterizer = pdf_rasterizer, ocr_enabled = ocr_enabled, "Health check completed");

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: SERVICE_NAME.to_string(),
        uptime_seconds: Some(STARTED_AT.elapsed().as_secs()),
        tools: ToolAvailability {
            pdf_rasterizer,
            ocr_engine: ocr_enabled,
            ocr_enabled: state.config.ocr_enabled,
        },
    })
}

/// `GET /ready`: fails while PDF pages cannot be rasterized.
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.dispatcher.rasterizer().is_available().await {
        Ok(StatusCode::OK)
    } else {
        info!(rasterizer = state.dispatcher.rasterizer().name(), "Readiness check failed");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
