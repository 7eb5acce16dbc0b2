// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pixel boxes to image-size-independent fractions

use serde::{Deserialize, Serialize};

use crate::detection::PixelBox;
use crate::vision::ImageDimensions;

/// Decimal digits kept in normalized coordinates
pub const NORMALIZED_PRECISION: i32 = 6;

/// Center-format box as fractions of image width (x, width) and height
/// (y, height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Largest magnitude below which an f64 can still carry a fractional part
const FRACTIONAL_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

/// Round to [`NORMALIZED_PRECISION`] decimal digits.
///
/// Rounds the exact binary value, not the product `value * 10^6`, which can
/// itself round onto a half. Exact ties go to even.
pub fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(NORMALIZED_PRECISION);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= FRACTIONAL_LIMIT {
        return value;
    }

    // Error of the product, exact under fused multiply-add
    let residual = value.mul_add(factor, -scaled);
    let floor = scaled.floor();
    let fraction = scaled - floor;

    let rounded = if fraction > 0.5 || (fraction == 0.5 && residual > 0.0) {
        floor + 1.0
    } else if fraction < 0.5 || residual < 0.0 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };

    rounded / factor
}

/// Divide each coordinate by the matching image side and round
pub fn normalize_box(bbox: &PixelBox, dimensions: ImageDimensions) -> NormalizedBox {
    let w = f64::from(dimensions.width.get());
    let h = f64::from(dimensions.height.get());

    NormalizedBox {
        x: round_to_precision(f64::from(bbox.center_x) / w),
        y: round_to_precision(f64::from(bbox.center_y) / h),
        width: round_to_precision(f64::from(bbox.width) / w),
        height: round_to_precision(f64::from(bbox.height) / h),
    }
}
