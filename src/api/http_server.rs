// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::Semaphore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::predict::predict_handler;
use crate::pipeline::PredictionPipeline;

/// Base64 grows payloads by 4/3; leave headroom for the data-URL prefix and
/// the JSON envelope.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PredictionPipeline>,
    /// Bounds the number of requests running on blocking workers
    pub workers: Arc<Semaphore>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: PredictionPipeline, max_concurrent_requests: usize, max_image_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: Arc::new(Semaphore::new(max_concurrent_requests)),
            max_body_bytes: max_image_bytes.div_ceil(3) * 4 + BODY_OVERHEAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub class_count: usize,
    pub metadata_version: String,
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::VERSION.to_string(),
        model: state.pipeline.model_name().to_string(),
        class_count: state.pipeline.class_count(),
        metadata_version: state.pipeline.metadata().version().to_string(),
    })
}
