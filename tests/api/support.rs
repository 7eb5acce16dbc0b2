// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers: a scripted detection source and in-memory test images

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dentascan::{
    api::http_server::{create_app, AppState},
    ClassTable, ClinicalMetadata, DetectionError, DetectionSource, Detections, PixelBox,
    PredictionPipeline, RawDetection,
};
use image::{DynamicImage, ImageFormat};

pub const STUB_MODEL_NAME: &str = "stub-yolo";

/// Returns the same detections for every image
pub struct ScriptedSource {
    pub classes: ClassTable,
    /// Extra class ids reported at detect time only
    pub extra_classes: ClassTable,
    pub detections: Vec<RawDetection>,
}

impl DetectionSource for ScriptedSource {
    fn class_table(&self) -> &ClassTable {
        &self.classes
    }

    fn model_name(&self) -> &str {
        STUB_MODEL_NAME
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Detections, DetectionError> {
        let mut classes = self.classes.clone();
        classes.extend(self.extra_classes.clone());
        Ok(Detections {
            classes,
            detections: self.detections.clone(),
        })
    }
}

pub fn detection(class_id: u32, confidence: f32, cx: f32, cy: f32, w: f32, h: f32) -> RawDetection {
    RawDetection {
        class_id,
        confidence,
        bbox: PixelBox {
            center_x: cx,
            center_y: cy,
            width: w,
            height: h,
        },
    }
}

pub fn app_with_source(source: ScriptedSource) -> Router {
    let metadata = Arc::new(ClinicalMetadata::embedded().unwrap());
    let pipeline = PredictionPipeline::new(Arc::new(source), metadata, 10 * 1024 * 1024)
        .expect("stub source should be covered by embedded metadata");
    create_app(AppState::new(pipeline, 2, 10 * 1024 * 1024))
}

pub fn app_with_detections(detections: Vec<RawDetection>) -> Router {
    let classes = ClinicalMetadata::embedded().unwrap().canonical_names();
    app_with_source(ScriptedSource {
        classes,
        extra_classes: ClassTable::new(),
        detections,
    })
}

/// Blank image of the given size, encoded and base64'd
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> String {
    let image = DynamicImage::new_rgb8(width, height);
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format).unwrap();
    STANDARD.encode(bytes.into_inner())
}

pub fn json_request(method: Method, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
