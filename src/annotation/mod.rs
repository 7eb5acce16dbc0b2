// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-to-annotation stages: box normalization, clinical enrichment
//! and result assembly.

pub mod assemble;
pub mod metadata;
pub mod normalize;

pub use assemble::{assemble, enrich, AnnotatedDetection, LabelBox, PredictionResult};
pub use metadata::{ClinicalMetadata, ClinicalRecord, MetadataError};
pub use normalize::{normalize_box, round_to_precision, NormalizedBox};
