// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO output decoding
//!
//! The exported detector emits a `[1, 4 + nc, N]` tensor: for each of N
//! anchors, a center-format box in model-input pixels followed by one score
//! per class.

use std::cmp::Ordering;

use ndarray::{ArrayViewD, Ix3};

use super::preprocessing::Letterbox;
use super::{DetectionError, PixelBox, RawDetection};

/// Thresholds applied while decoding
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

/// Corner-format candidate in model-input pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: u32,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Extract per-anchor candidates scoring above the confidence threshold
pub fn extract_candidates(
    output: ArrayViewD<f32>,
    num_classes: usize,
    confidence_threshold: f32,
) -> Result<Vec<Candidate>, DetectionError> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(DetectionError::InvalidOutput(format!(
            "expected [1, 4 + nc, N], got {:?}",
            shape
        )));
    }
    if shape[1] != 4 + num_classes {
        return Err(DetectionError::InvalidOutput(format!(
            "expected {} rows for {} classes, got {}",
            4 + num_classes,
            num_classes,
            shape[1]
        )));
    }

    let output = output
        .into_dimensionality::<Ix3>()
        .map_err(|e| DetectionError::InvalidOutput(e.to_string()))?;
    let anchors = shape[2];
    let mut candidates = Vec::new();

    for a in 0..anchors {
        let (class_id, confidence) = (0..num_classes)
            .map(|c| (c, output[[0, 4 + c, a]]))
            .fold((0usize, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if confidence < confidence_threshold {
            continue;
        }

        let cx = output[[0, 0, a]];
        let cy = output[[0, 1, a]];
        let w = output[[0, 2, a]];
        let h = output[[0, 3, a]];

        candidates.push(Candidate {
            class_id: class_id as u32,
            confidence,
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        });
    }

    Ok(candidates)
}

/// Class-aware non-maximum suppression.
///
/// Returns survivors ordered by descending confidence, at most `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

/// Map a candidate back to original image pixels, clip it to the image and
/// report it in center format.
pub fn to_raw_detection(
    candidate: &Candidate,
    placement: &Letterbox,
    image_width: u32,
    image_height: u32,
) -> RawDetection {
    let max_x = image_width as f32;
    let max_y = image_height as f32;

    let x1 = placement.unmap_x(candidate.x1).clamp(0.0, max_x);
    let y1 = placement.unmap_y(candidate.y1).clamp(0.0, max_y);
    let x2 = placement.unmap_x(candidate.x2).clamp(0.0, max_x);
    let y2 = placement.unmap_y(candidate.y2).clamp(0.0, max_y);

    RawDetection {
        class_id: candidate.class_id,
        confidence: candidate.confidence,
        bbox: PixelBox {
            center_x: (x1 + x2) / 2.0,
            center_y: (y1 + y2) / 2.0,
            width: x2 - x1,
            height: y2 - y1,
        },
    }
}

/// Full decode: candidates, NMS, and mapping into image pixels
pub fn decode_output(
    output: ArrayViewD<f32>,
    num_classes: usize,
    params: &DecodeParams,
    placement: &Letterbox,
    image_width: u32,
    image_height: u32,
) -> Result<Vec<RawDetection>, DetectionError> {
    let candidates = extract_candidates(output, num_classes, params.confidence_threshold)?;
    let kept = non_max_suppression(candidates, params.iou_threshold, params.max_detections);

    Ok(kept
        .iter()
        .map(|c| to_raw_detection(c, placement, image_width, image_height))
        .collect())
}
