// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Radiograph ingestion: transport payload to raster image

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Default maximum decoded image size (10MB)
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Data-URL prefixes stripped before base64 decoding. Any other prefix is
/// left in place and fails decoding.
const DATA_URL_PREFIXES: &[&str] = &["data:image/jpeg;base64,", "data:image/png;base64,"];

/// Errors raised while turning a payload into a raster image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No image provided")]
    MissingInput,

    #[error("Image payload must be a base64 string, got {0}")]
    NotAString(&'static str),

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Image has zero width or height")]
    ZeroDimensions,
}

/// Pixel dimensions of a decoded image. Both sides are positive by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: NonZeroU32::new(width)?,
            height: NonZeroU32::new(height)?,
        })
    }
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub dimensions: ImageDimensions,
    /// Detected format
    pub format: ImageFormat,
    /// Size of the decoded byte stream
    pub size_bytes: usize,
}

/// Remove a known JPEG/PNG data-URL prefix, if present
pub fn strip_data_url_prefix(payload: &str) -> &str {
    DATA_URL_PREFIXES
        .iter()
        .find_map(|prefix| payload.strip_prefix(prefix))
        .unwrap_or(payload)
}

/// Decode an optional request payload into a raster image.
///
/// `None` means no image was supplied. An empty string is a payload and fails
/// decoding.
pub fn ingest_payload(
    payload: Option<&str>,
    max_size: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    match payload {
        Some(data) => decode_base64_image(data, max_size),
        None => Err(ImageError::MissingInput),
    }
}

/// Decode a base64-encoded image, optionally wrapped in a data URL
///
/// # Example
/// ```ignore
/// let (image, info) = decode_base64_image("data:image/png;base64,iVBORw0KGgo...", MAX)?;
/// println!("Image size: {}x{}", info.dimensions.width, info.dimensions.height);
/// ```
pub fn decode_base64_image(
    payload: &str,
    max_size: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    let encoded = strip_data_url_prefix(payload);
    if encoded.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(encoded)?;
    decode_image_bytes(&bytes, max_size)
}

/// Decode raw image bytes
pub fn decode_image_bytes(
    bytes: &[u8],
    max_size: usize,
) -> Result<(DynamicImage, ImageInfo), ImageError> {
    if bytes.len() > max_size {
        return Err(ImageError::TooLarge(bytes.len(), max_size));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let dimensions =
        ImageDimensions::new(img.width(), img.height()).ok_or(ImageError::ZeroDimensions)?;

    let info = ImageInfo {
        dimensions,
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
