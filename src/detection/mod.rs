// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection over dental radiographs
//!
//! Components:
//! - `yolo` - ONNX Runtime YOLO detector
//! - `preprocessing` - Letterbox resize into the model input tensor
//! - `postprocess` - Candidate decoding, NMS and mapping back to image pixels
//! - `class_names` - Class table parsing from model metadata

pub mod class_names;
pub mod postprocess;
pub mod preprocessing;
pub mod yolo;

use std::collections::BTreeMap;

use image::DynamicImage;
use thiserror::Error;

pub use yolo::{OnnxYoloDetector, YoloParams};

/// Class id to human-readable class name, as reported by the detector
pub type ClassTable = BTreeMap<u32, String>;

/// Bounding box in center format, absolute pixels of the ingested image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

/// A single raw detection
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub bbox: PixelBox,
}

/// Everything the detector reports for one image
#[derive(Debug, Clone, Default)]
pub struct Detections {
    pub classes: ClassTable,
    /// In detector order
    pub detections: Vec<RawDetection>,
}

impl Detections {
    /// Name of `class_id` in the detector's own class table
    pub fn class_name(&self, class_id: u32) -> Result<&str, DetectionError> {
        self.classes
            .get(&class_id)
            .map(String::as_str)
            .ok_or(DetectionError::UnknownClass(class_id))
    }
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detection model not found: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    Session(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("Detector reported class id {0} missing from its class table")]
    UnknownClass(u32),

    #[error("Model class table is empty")]
    EmptyClassTable,

    #[error("Inference lock poisoned by a previous panic")]
    Poisoned,
}

/// Turns a raster image into raw detections.
///
/// Implementations are shared across request workers and must be safe to
/// call concurrently; a non-reentrant backend serializes internally.
pub trait DetectionSource: Send + Sync {
    /// Every class id this source can emit
    fn class_table(&self) -> &ClassTable;

    /// Name of the underlying model, for logs and health reporting
    fn model_name(&self) -> &str;

    fn detect(&self, image: &DynamicImage) -> Result<Detections, DetectionError>;
}
