use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::Json,
};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::middleware::request_id;
use crate::models::{ProcessFileRequest, ProcessFileResponse};
use crate::services::decoder::decode_request;
use crate::AppState;

/// `POST /process-file/`: decode, sniff, extract.
pub async fn process_file_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProcessFileRequest>, JsonRejection>,
) -> AppResult<Json<ProcessFileResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers).unwrap_or_else(|| "-".to_string());

    let Json(payload) = payload.map_err(|rejection| {
        error!(request_id = %request_id, error = %rejection.body_text(), "Rejected request body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            oversized_body(&headers, state.config.max_file_size_mb)
        } else {
            AppError::validation(rejection.body_text())
        }
    })?;

    let request = decode_request(payload, state.config.max_file_size_bytes())?;
    info!(
        request_id = %request_id,
        size_bytes = request.size(),
        filename = request.filename.as_deref().unwrap_or("-"),
        "Payload decoded"
    );

    let result = match timeout(state.config.request_timeout(), state.dispatcher.process(&request)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(request_id = %request_id, error = %e, "File processing failed");
            return Err(e);
        }
        Err(elapsed) => {
            error!(request_id = %request_id, "File processing timed out");
            return Err(elapsed.into());
        }
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        detected_type = %result.detected_type(),
        blocks = result.blocks.len(),
        processing_time_ms = processing_time_ms,
        "Request processed successfully"
    );

    Ok(Json(ProcessFileResponse::success(result, processing_time_ms)))
}

/// Estimates the decoded size of a body rejected by the length limit.
fn oversized_body(headers: &HeaderMap, limit_mb: usize) -> AppError {
    let encoded = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let size_mb = (encoded / 4 * 3).div_ceil(1024 * 1024).max(limit_mb + 1);
    AppError::FileTooLarge {
        size: size_mb,
        limit: limit_mb,
    }
}
