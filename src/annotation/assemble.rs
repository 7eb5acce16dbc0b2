// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result assembly: detections to API-ready labels

use serde::{Deserialize, Serialize};

use super::metadata::{ClinicalMetadata, ClinicalRecord};
use super::normalize::{normalize_box, NormalizedBox};
use crate::detection::{ClassTable, Detections};
use crate::pipeline::PipelineError;
use crate::vision::ImageDimensions;

/// Normalized box tagged with its class id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelBox {
    pub class_id: u32,
    #[serde(flatten)]
    pub bounds: NormalizedBox,
}

/// One annotated finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedDetection {
    /// 1-based position in detector order
    pub id: usize,
    pub class_id: u32,
    /// Detector class name
    pub name: String,
    pub confidence: f32,
    pub bbox: LabelBox,
    pub treatment: ClinicalRecord,
}

/// Complete response for one radiograph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Detector class table, passed through unchanged
    pub classes: ClassTable,
    pub labels: Vec<AnnotatedDetection>,
}

/// Look up the clinical record of every detection.
///
/// Any gap aborts the whole request: no partial set of records is returned.
pub fn enrich<'m>(
    detections: &Detections,
    metadata: &'m ClinicalMetadata,
) -> Result<Vec<&'m ClinicalRecord>, PipelineError> {
    detections
        .detections
        .iter()
        .map(|d| {
            metadata
                .lookup(d.class_id)
                .map_err(|_| PipelineError::MetadataGap {
                    class_id: d.class_id,
                })
        })
        .collect()
}

/// Build the prediction result, preserving detector order
pub fn assemble(
    detections: Detections,
    dimensions: ImageDimensions,
    metadata: &ClinicalMetadata,
) -> Result<PredictionResult, PipelineError> {
    let treatments = enrich(&detections, metadata)?;

    let labels = detections
        .detections
        .iter()
        .zip(treatments)
        .enumerate()
        .map(|(index, (detection, treatment))| {
            let name = detections.class_name(detection.class_id)?.to_string();
            Ok(AnnotatedDetection {
                id: index + 1,
                class_id: detection.class_id,
                name,
                confidence: detection.confidence,
                bbox: LabelBox {
                    class_id: detection.class_id,
                    bounds: normalize_box(&detection.bbox, dimensions),
                },
                treatment: treatment.clone(),
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    Ok(PredictionResult {
        classes: detections.classes,
        labels,
    })
}
