// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image ingestion for radiograph analysis

pub mod image_utils;

pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, ingest_payload,
    strip_data_url_prefix, ImageDimensions, ImageError, ImageInfo, DEFAULT_MAX_IMAGE_SIZE,
};
