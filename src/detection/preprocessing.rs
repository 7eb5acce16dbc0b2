// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the YOLO detector

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size of exported YOLO models
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Letterbox padding colour used at training time
pub const PAD_VALUE: u8 = 114;

/// How an original image was placed inside the square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Original pixels to input pixels
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Compute the placement of a `width` x `height` image in a square input
    pub fn fit(width: u32, height: u32, target_size: u32) -> Self {
        let scale = (target_size as f32 / width as f32).min(target_size as f32 / height as f32);
        let (new_w, new_h) = scaled_size(width, height, scale);

        Self {
            scale,
            pad_x: ((target_size - new_w) / 2) as f32,
            pad_y: ((target_size - new_h) / 2) as f32,
        }
    }

    /// Map an input-space x coordinate back to original pixels
    pub fn unmap_x(&self, x: f32) -> f32 {
        (x - self.pad_x) / self.scale
    }

    /// Map an input-space y coordinate back to original pixels
    pub fn unmap_y(&self, y: f32) -> f32 {
        (y - self.pad_y) / self.scale
    }
}

fn scaled_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let new_w = ((width as f32 * scale).round() as u32).max(1);
    let new_h = ((height as f32 * scale).round() as u32).max(1);
    (new_w, new_h)
}

/// Resize with aspect ratio preservation and centre the result on a
/// `target_size` square filled with [`PAD_VALUE`].
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (RgbImage, Letterbox) {
    let (orig_w, orig_h) = image.dimensions();
    let placement = Letterbox::fit(orig_w, orig_h, target_size);
    let (new_w, new_h) = scaled_size(orig_w, orig_h, placement.scale);

    let resized = image.resize_exact(new_w, new_h, FilterType::Triangle).to_rgb8();

    let mut output = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );
    image::imageops::replace(
        &mut output,
        &resized,
        placement.pad_x as i64,
        placement.pad_y as i64,
    );

    (output, placement)
}

/// Build the `[1, 3, S, S]` NCHW tensor with pixel values scaled to [0, 1]
pub fn preprocess_for_detection(image: &DynamicImage, target_size: u32) -> (Array4<f32>, Letterbox) {
    let (rgb, placement) = letterbox(image, target_size);
    let size = target_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, placement)
}
