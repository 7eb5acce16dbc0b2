// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO detector running on ONNX Runtime
//!
//! Runs on CPU. ONNX Runtime sessions need exclusive access for `run`, so the
//! session sits behind a mutex and at most one inference is in flight.

use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GenericImageView};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use tracing::{debug, info, warn};

use super::class_names::parse_class_names;
use super::postprocess::{decode_output, DecodeParams};
use super::preprocessing::{preprocess_for_detection, DEFAULT_INPUT_SIZE};
use super::{ClassTable, DetectionError, DetectionSource, Detections};

/// Metadata key under which exported YOLO models store their class table
const NAMES_METADATA_KEY: &str = "names";

/// Inference parameters
#[derive(Debug, Clone)]
pub struct YoloParams {
    /// Square model input size
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
            intra_threads: 4,
        }
    }
}

impl YoloParams {
    fn decode_params(&self) -> DecodeParams {
        DecodeParams {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
        }
    }
}

#[derive(Clone)]
pub struct OnnxYoloDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    model_name: String,
    classes: ClassTable,
    params: YoloParams,
}

impl std::fmt::Debug for OnnxYoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxYoloDetector")
            .field("model_name", &self.model_name)
            .field("input_name", &self.input_name)
            .field("classes", &self.classes.len())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl OnnxYoloDetector {
    /// Load a YOLO detector from an ONNX file
    ///
    /// The class table comes from the model's `names` metadata. Models exported
    /// without it use `fallback_names` instead.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - No usable class table is available
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        params: YoloParams,
        fallback_names: Option<ClassTable>,
    ) -> Result<Self, DetectionError> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(DetectionError::ModelNotFound(model_path.display().to_string()));
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .map_err(session_error)?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(session_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(session_error)?
            .with_intra_threads(params.intra_threads)
            .map_err(session_error)?
            .commit_from_file(model_path)
            .map_err(session_error)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let classes = match read_class_names(&session) {
            Some(table) => table,
            None => {
                warn!("Model has no readable class metadata, using fallback class names");
                fallback_names.unwrap_or_default()
            }
        };
        validate_class_table(&classes)?;

        let model_name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "yolo".to_string());

        info!(
            "✅ Detection model '{}' loaded ({} classes, input {}x{}, CPU-only)",
            model_name,
            classes.len(),
            params.input_size,
            params.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            model_name,
            classes,
            params,
        })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }
}

fn session_error(e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Session(e.to_string())
}

fn read_class_names(session: &Session) -> Option<ClassTable> {
    let raw = match session.metadata().and_then(|m| m.custom(NAMES_METADATA_KEY)) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read model metadata: {}", e);
            return None;
        }
    };

    match parse_class_names(&raw) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("Ignoring unparseable class names metadata: {}", e);
            None
        }
    }
}

/// Class ids must run 0..n, matching the score rows of the model output
fn validate_class_table(classes: &ClassTable) -> Result<(), DetectionError> {
    if classes.is_empty() {
        return Err(DetectionError::EmptyClassTable);
    }
    if !classes.keys().copied().eq(0..classes.len() as u32) {
        return Err(DetectionError::InvalidOutput(format!(
            "class ids must be contiguous from 0, got {:?}",
            classes.keys().collect::<Vec<_>>()
        )));
    }
    Ok(())
}

impl DetectionSource for OnnxYoloDetector {
    fn class_table(&self) -> &ClassTable {
        &self.classes
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn detect(&self, image: &DynamicImage) -> Result<Detections, DetectionError> {
        let (width, height) = image.dimensions();
        let (input, placement) = preprocess_for_detection(image, self.params.input_size);
        let input_value = Value::from_array(input).map_err(session_error)?;

        let mut session = self.session.lock().map_err(|_| DetectionError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .map_err(session_error)?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(session_error)?;
        debug!("Detection output shape: {:?}", output_tensor.shape());

        let detections = decode_output(
            output_tensor.view(),
            self.classes.len(),
            &self.params.decode_params(),
            &placement,
            width,
            height,
        )?;

        debug!("Detected {} objects in {}x{} image", detections.len(), width, height);

        Ok(Detections {
            classes: self.classes.clone(),
            detections,
        })
    }
}
