// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction request types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::vision::ImageError;

/// Request for radiograph annotation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Base64-encoded image, raw or as a `data:image/jpeg;base64,` /
    /// `data:image/png;base64,` data URL.
    ///
    /// `None` only when the key is absent; an explicit `null` is kept as
    /// `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PredictRequest {
    /// The image payload as text.
    ///
    /// A present but non-string `image` is an undecodable payload.
    pub fn image_payload(&self) -> Result<Option<&str>, ImageError> {
        match &self.image {
            None => Ok(None),
            Some(Value::String(data)) => Ok(Some(data)),
            Some(Value::Null) => Err(ImageError::NotAString("null")),
            Some(Value::Bool(_)) => Err(ImageError::NotAString("a boolean")),
            Some(Value::Number(_)) => Err(ImageError::NotAString("a number")),
            Some(Value::Array(_)) => Err(ImageError::NotAString("an array")),
            Some(Value::Object(_)) => Err(ImageError::NotAString("an object")),
        }
    }

    pub fn payload_len(&self) -> usize {
        match &self.image {
            Some(Value::String(data)) => data.len(),
            _ => 0,
        }
    }
}
