// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from flags and environment

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::detection::YoloParams;
use crate::vision::DEFAULT_MAX_IMAGE_SIZE;

/// Dental radiograph annotation service
#[derive(Parser, Debug, Clone)]
#[command(name = "dentascan")]
#[command(version)]
#[command(about = "Detects and annotates findings in dental radiographs", long_about = None)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5000")]
    pub listen_addr: SocketAddr,

    /// Exported YOLO detection model (ONNX)
    #[arg(long, env = "MODEL_PATH", default_value = "./models/model.onnx")]
    pub model_path: PathBuf,

    /// Clinical metadata JSON replacing the embedded table
    #[arg(long, env = "CLINICAL_METADATA_PATH")]
    pub metadata_path: Option<PathBuf>,

    /// Minimum detection confidence
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = 0.25)]
    pub confidence_threshold: f32,

    /// IoU above which overlapping same-class boxes are suppressed
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = 0.7)]
    pub iou_threshold: f32,

    /// Maximum detections reported per image
    #[arg(long, env = "MAX_DETECTIONS", default_value_t = 300)]
    pub max_detections: usize,

    /// Square model input size in pixels
    #[arg(long, env = "MODEL_INPUT_SIZE", default_value_t = 640)]
    pub input_size: u32,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Requests processed concurrently on blocking workers
    #[arg(long, env = "MAX_CONCURRENT_REQUESTS", default_value_t = 8)]
    pub max_concurrent_requests: usize,

    /// Largest accepted decoded image, in bytes
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_image_bytes: usize,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            bail!(
                "confidence_threshold must be within 0.0..=1.0, got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            bail!(
                "iou_threshold must be within 0.0..=1.0, got {}",
                self.iou_threshold
            );
        }
        if self.max_detections == 0 {
            bail!("max_detections must be greater than 0");
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            bail!(
                "input_size must be a positive multiple of 32, got {}",
                self.input_size
            );
        }
        if self.intra_threads == 0 {
            bail!("intra_threads must be greater than 0");
        }
        if self.max_concurrent_requests == 0 {
            bail!("max_concurrent_requests must be greater than 0");
        }
        if self.max_image_bytes == 0 {
            bail!("max_image_bytes must be greater than 0");
        }
        Ok(())
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.input_size,
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            intra_threads: self.intra_threads,
        }
    }
}
