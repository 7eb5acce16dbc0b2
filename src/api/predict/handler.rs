// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, error, warn};

use super::request::PredictRequest;
use crate::annotation::PredictionResult;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::pipeline::PipelineError;

/// POST /predict - Detect and annotate findings in a dental radiograph
///
/// # Request
/// - `image`: Base64-encoded image, optionally as a JPEG/PNG data URL (required)
///
/// # Response
/// - `classes`: Detector class id to class name table
/// - `labels`: Findings in detector order, each with a 1-based `id`,
///   `classId`, `name`, `confidence`, normalized `bbox` and clinical `treatment`
///
/// # Errors
/// - 400 Bad Request: `image` key absent or body not a JSON object
/// - 500 Internal Server Error: Decode (including a null, empty or
///   non-string `image`), inference or metadata failure
/// - 503 Service Unavailable: Worker pool shut down
pub async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected prediction request body: {}", rejection.body_text());
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    debug!(
        "Prediction request received ({} payload bytes)",
        request.payload_len()
    );

    // One permit per in-flight request bounds the blocking worker pool
    let permit = state.workers.clone().acquire_owned().await.map_err(|_| {
        warn!("Prediction worker pool is closed");
        ApiError::ServiceUnavailable("Prediction workers unavailable".to_string())
    })?;

    let pipeline = state.pipeline.clone();
    let outcome =
        tokio::task::spawn_blocking(move || -> Result<PredictionResult, PipelineError> {
            let _permit = permit;
            let payload = request.image_payload()?;
            pipeline.run(payload)
        })
        .await
        .map_err(|e| {
            error!("Prediction worker panicked or was cancelled: {}", e);
            ApiError::InternalError(format!("Prediction worker failed: {}", e))
        })?;

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if e.is_client_error() {
                warn!("Prediction request rejected: {}", e);
            } else {
                error!("Prediction failed: {:?}", e);
            }
            Err(e.into())
        }
    }
}

