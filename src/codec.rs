//! PNG/base64 wire encoding for images and masks.
//!
//! The backend speaks base64-encoded PNG in both directions; these
//! helpers are the only place that encoding lives.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GrayImage, ImageOutputFormat, RgbImage};

use crate::error::{OutpaintError, Result};

pub fn image_to_base64(image: &RgbImage) -> Result<String> {
    encode_png(DynamicImage::ImageRgb8(image.clone()))
}

pub fn mask_to_base64(mask: &GrayImage) -> Result<String> {
    encode_png(DynamicImage::ImageLuma8(mask.clone()))
}

fn encode_png(image: DynamicImage) -> Result<String> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .map_err(|e| OutpaintError::ImageError(format!("PNG encoding failed: {}", e)))?;
    Ok(STANDARD.encode(&bytes))
}

/// Decodes a base64 PNG returned by the backend into an RGB buffer.
pub fn base64_to_image(data: &str) -> Result<RgbImage> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| OutpaintError::ResponseError(format!("invalid base64 image: {}", e)))?;
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| OutpaintError::ResponseError(format!("invalid PNG image: {}", e)))?;
    Ok(decoded.to_rgb8())
}
