// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use dentascan::{
    api::{start_server, AppState},
    ClinicalMetadata, OnnxYoloDetector, PredictionPipeline, ServerConfig,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading configuration
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServerConfig::parse();
    config.validate().context("Invalid configuration")?;

    tracing::info!("🚀 Starting {}", dentascan::version::get_version_string());
    tracing::info!("Features: {}", dentascan::version::FEATURES.join(", "));

    // Clinical metadata: embedded table unless overridden
    let metadata = match &config.metadata_path {
        Some(path) => ClinicalMetadata::from_path(path)
            .with_context(|| format!("Failed to load clinical metadata from {}", path.display()))?,
        None => ClinicalMetadata::embedded().context("Embedded clinical metadata is invalid")?,
    };
    tracing::info!(
        "✅ Clinical metadata v{} loaded ({} classes)",
        metadata.version(),
        metadata.len()
    );

    // Detection model, loaded once for the process lifetime
    let detector = OnnxYoloDetector::new(
        &config.model_path,
        config.yolo_params(),
        Some(metadata.canonical_names()),
    )
    .with_context(|| {
        format!(
            "Failed to load detection model from {}",
            config.model_path.display()
        )
    })?;

    // Fails fast when the model can emit classes the table does not describe
    let pipeline = PredictionPipeline::new(
        Arc::new(detector),
        Arc::new(metadata),
        config.max_image_bytes,
    )
    .context("Clinical metadata is out of sync with the detection model")?;

    tracing::info!(
        "Worker pool: {} concurrent requests, max image {} bytes",
        config.max_concurrent_requests,
        config.max_image_bytes
    );
    tracing::info!("  Health:   GET  http://{}/health", config.listen_addr);
    tracing::info!("  Predict:  POST http://{}/predict", config.listen_addr);

    let state = AppState::new(
        pipeline,
        config.max_concurrent_requests,
        config.max_image_bytes,
    );
    start_server(config.listen_addr, state).await?;

    tracing::info!("👋 Goodbye!");
    Ok(())
}
