use std::path::Path;

use anyhow::Context;
use image::{RgbImage, imageops::FilterType};

use crate::foundation::error::VoidResult;

/// File extensions accepted as source artwork.
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

pub fn is_source_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Decode an image file into straight RGB8.
pub fn load_rgb(path: &Path) -> VoidResult<RgbImage> {
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img.to_rgb8())
}

/// Downscale so the longer side is at most `max_dim`, preserving aspect.
pub fn cap_dimension(img: RgbImage, max_dim: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if max_dim == 0 || longest <= max_dim {
        return img;
    }
    let scale = f64::from(max_dim) / f64::from(longest);
    let nw = ((f64::from(w) * scale).round() as u32).max(1);
    let nh = ((f64::from(h) * scale).round() as u32).max(1);
    image::imageops::resize(&img, nw, nh, FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/decode.rs"]
mod tests;
