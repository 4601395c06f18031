//! Pure pixel operations behind a generation round trip: mask
//! generation, canvas padding, edge cropping, stitching, and the
//! orthogonal-axis resize. No I/O and no state beyond a mask memo.

use std::collections::HashMap;
use std::sync::Mutex;

use image::{imageops, GrayImage, Luma, RgbImage};
use once_cell::sync::Lazy;

use crate::direction::Direction;
use crate::error::{OutpaintError, Result};

/// Masks depend only on (width, direction, canvas), so identical requests
/// across consecutive iterations reuse the same buffer.
static MASK_CACHE: Lazy<Mutex<HashMap<(u32, Direction, u32), GrayImage>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Builds the inpainting mask: an all-white canvas with a black band of
/// `mask_width` protecting the edge where existing content is anchored.
/// White pixels are the ones the backend may repaint.
pub fn generate_mask(mask_width: u32, direction: Direction, canvas_size: u32) -> Result<GrayImage> {
    if mask_width == 0 || mask_width >= canvas_size {
        return Err(OutpaintError::InvalidArgument(format!(
            "mask width {} outside (0, {})",
            mask_width, canvas_size
        )));
    }

    let key = (mask_width, direction, canvas_size);
    if let Ok(cache) = MASK_CACHE.lock() {
        if let Some(mask) = cache.get(&key) {
            return Ok(mask.clone());
        }
    }

    let mut mask = GrayImage::from_pixel(canvas_size, canvas_size, Luma([255]));
    let band = direction.layout().protected_band(mask_width, canvas_size);
    for y in band.y..band.bottom() {
        for x in band.x..band.right() {
            mask.put_pixel(x, y, Luma([0]));
        }
    }

    if let Ok(mut cache) = MASK_CACHE.lock() {
        cache.insert(key, mask.clone());
    }
    Ok(mask)
}

/// Embeds `image` into a zero-filled square canvas, anchored so the empty
/// space lines up with the open region of the companion mask.
pub fn pad_image(image: &RgbImage, direction: Direction, canvas_size: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width > canvas_size || height > canvas_size {
        return Err(OutpaintError::InvalidArgument(format!(
            "image {}x{} exceeds the {}px canvas",
            width, height, canvas_size
        )));
    }

    let mut canvas = RgbImage::new(canvas_size, canvas_size);
    let (x, y) = direction.layout().pad_origin(width, height, canvas_size);
    imageops::replace(&mut canvas, image, x as i64, y as i64);
    Ok(canvas)
}

/// Stitches a generated canvas onto the original, extending it by
/// `generate_width` along the growth axis. The generated buffer is pasted
/// second, so it owns the overlap seam exactly as wide as the backend
/// repainted it.
pub fn concat_images(
    original: &RgbImage,
    generated: &RgbImage,
    generate_width: u32,
    direction: Direction,
) -> Result<RgbImage> {
    if generate_width == 0 {
        return Err(OutpaintError::InvalidArgument(
            "generate width must be positive".into(),
        ));
    }
    let layout = direction.layout();
    let (orig_w, orig_h) = original.dimensions();
    let (gen_w, gen_h) = generated.dimensions();
    let generated_extent = if layout.horizontal { gen_w } else { gen_h };
    if generated_extent < generate_width {
        return Err(OutpaintError::InvalidArgument(format!(
            "generated extent {} cannot cover a {}px strip",
            generated_extent, generate_width
        )));
    }

    let (out_w, out_h) = if layout.horizontal {
        (orig_w + generate_width, orig_h)
    } else {
        (orig_w, orig_h + generate_width)
    };
    let ((ox, oy), (gx, gy)) =
        layout.stitch_offsets((orig_w, orig_h), (gen_w, gen_h), generate_width);

    let mut output = RgbImage::new(out_w, out_h);
    imageops::replace(&mut output, original, ox, oy);
    imageops::replace(&mut output, generated, gx, gy);
    Ok(output)
}

/// The step-2 crop of a generate cycle: the band of the current image
/// bordering the growth edge, `canvas_size - generate_width` deep.
pub fn crop_region(
    image: &RgbImage,
    direction: Direction,
    canvas_size: u32,
    generate_width: u32,
) -> Result<RgbImage> {
    if generate_width == 0 || generate_width >= canvas_size {
        return Err(OutpaintError::InvalidArgument(format!(
            "generate width {} outside (0, {})",
            generate_width, canvas_size
        )));
    }
    let layout = direction.layout();
    let (width, height) = image.dimensions();
    let extent = canvas_size - generate_width;
    let source_extent = if layout.horizontal { width } else { height };
    if source_extent < extent {
        return Err(OutpaintError::InvalidArgument(format!(
            "source extent {} shorter than the {}px crop",
            source_extent, extent
        )));
    }

    let rect = layout.crop_box(width, height, canvas_size, generate_width);
    Ok(imageops::crop_imm(image, rect.x, rect.y, rect.w, rect.h).to_image())
}

/// Aspect-preserving resize so the non-growth axis equals the canvas
/// size. Returns `None` when the image already conforms.
pub fn normalize_orthogonal(
    image: &RgbImage,
    direction: Direction,
    canvas_size: u32,
) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    if direction.is_horizontal() {
        if height == canvas_size {
            return None;
        }
        let new_width = (width as f64 / height as f64 * canvas_size as f64).round() as u32;
        Some(imageops::resize(
            image,
            new_width.max(1),
            canvas_size,
            imageops::FilterType::CatmullRom,
        ))
    } else {
        if width == canvas_size {
            return None;
        }
        let new_height = (height as f64 / width as f64 * canvas_size as f64).round() as u32;
        Some(imageops::resize(
            image,
            canvas_size,
            new_height.max(1),
            imageops::FilterType::CatmullRom,
        ))
    }
}
