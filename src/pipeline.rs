// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request prediction pipeline
//!
//! Ingest -> Detect -> Normalize -> Enrich -> Assemble, strictly in sequence
//! on the calling thread. Each run ends in a complete `PredictionResult` or a
//! single error; nothing partial is ever returned.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::annotation::{assemble, ClinicalMetadata, MetadataError, PredictionResult};
use crate::detection::{DetectionError, DetectionSource};
use crate::vision::{ingest_payload, ImageError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No image provided: field 'image' is required")]
    MissingInput,

    #[error("{0}")]
    Decode(ImageError),

    #[error("Inference failed: {0}")]
    Inference(#[from] DetectionError),

    #[error("No clinical metadata for class id {class_id}")]
    MetadataGap { class_id: u32 },
}

impl PipelineError {
    /// True when the caller sent a bad request rather than the server failing
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::MissingInput)
    }
}

impl From<ImageError> for PipelineError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::MissingInput => PipelineError::MissingInput,
            other => PipelineError::Decode(other),
        }
    }
}

/// Shared, read-only pipeline state
pub struct PredictionPipeline {
    source: Arc<dyn DetectionSource>,
    metadata: Arc<ClinicalMetadata>,
    max_image_bytes: usize,
}

impl std::fmt::Debug for PredictionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionPipeline")
            .field("model", &self.source.model_name())
            .field("metadata_version", &self.metadata.version())
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}

impl PredictionPipeline {
    /// Wire a detection source to the clinical table.
    ///
    /// Fails when the table does not describe every class the source can emit.
    pub fn new(
        source: Arc<dyn DetectionSource>,
        metadata: Arc<ClinicalMetadata>,
        max_image_bytes: usize,
    ) -> Result<Self, MetadataError> {
        metadata.ensure_covers(source.class_table())?;

        Ok(Self {
            source,
            metadata,
            max_image_bytes,
        })
    }

    pub fn model_name(&self) -> &str {
        self.source.model_name()
    }

    pub fn class_count(&self) -> usize {
        self.source.class_table().len()
    }

    pub fn metadata(&self) -> &ClinicalMetadata {
        &self.metadata
    }

    /// Run one request end to end. Blocking.
    pub fn run(&self, payload: Option<&str>) -> Result<PredictionResult, PipelineError> {
        let started = Instant::now();

        let (image, info) = ingest_payload(payload, self.max_image_bytes)?;
        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            info.dimensions.width, info.dimensions.height, info.format, info.size_bytes
        );

        let detections = self.source.detect(&image)?;
        let count = detections.detections.len();

        let result = assemble(detections, info.dimensions, &self.metadata)?;

        info!(
            "Prediction complete: {} labels, {}ms",
            count,
            started.elapsed().as_millis()
        );

        Ok(result)
    }
}
