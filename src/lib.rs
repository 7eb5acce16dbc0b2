// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod annotation;
pub mod api;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod version;
pub mod vision;

// Re-export main types
pub use annotation::{
    AnnotatedDetection, ClinicalMetadata, ClinicalRecord, NormalizedBox, PredictionResult,
};
pub use config::ServerConfig;
pub use detection::{
    ClassTable, DetectionError, DetectionSource, Detections, OnnxYoloDetector, PixelBox,
    RawDetection, YoloParams,
};
pub use pipeline::{PipelineError, PredictionPipeline};
pub use vision::{ImageDimensions, ImageError};
