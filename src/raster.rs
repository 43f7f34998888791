//! Image preparation shared by the renderer and the page chrome.

use crate::error::AppError;
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use std::io::Read;

/// Longest edge kept for embedded photographs.
pub const MAX_PHOTO_EDGE: u32 = 1200;

/// Composite an image with transparency against a white background.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba_image = image.to_rgba8();
    let (width_px, height_px) = rgba_image.dimensions();

    let mut rgb_image = RgbImage::new(width_px, height_px);
    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
        rgb_image.put_pixel(x, y, Rgb([out_r, out_g, out_b]));
    }
    rgb_image
}

/// Largest (width, height) with the image's aspect ratio inside the box.
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    let aspect_ratio = width / height;
    if max_width / max_height > aspect_ratio {
        // Height-constrained
        (max_height * aspect_ratio, max_height)
    } else {
        // Width-constrained
        (max_width, max_width / aspect_ratio)
    }
}

/// Decode an attached photo, bounded to `MAX_PHOTO_EDGE`, on white.
pub fn decode_photo(bytes: &[u8]) -> Result<RgbImage, AppError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AppError::ImageError(format!("Failed to decode image: {}", e)))?;
    let image = if image.width() > MAX_PHOTO_EDGE || image.height() > MAX_PHOTO_EDGE {
        image.thumbnail(MAX_PHOTO_EDGE, MAX_PHOTO_EDGE)
    } else {
        image
    };
    Ok(flatten_on_white(&image))
}

/// Load an image from a file path or an http(s) URL.
pub fn load_image(source: &str) -> Result<DynamicImage, AppError> {
    let image_bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source)
            .call()
            .map_err(|e| AppError::ImageError(format!("Failed to fetch URL: {}", e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::ImageError(format!("Failed to read response: {}", e)))?;
        bytes
    } else {
        std::fs::read(source).map_err(|e| AppError::ImageError(format!("{}: {}", source, e)))?
    };

    image::load_from_memory(&image_bytes)
        .map_err(|e| AppError::ImageError(format!("Failed to decode image: {}", e)))
}
