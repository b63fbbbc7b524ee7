use image::{ DynamicImage, GenericImageView, imageops::FilterType };

use std::fs;
use std::path::{ Path, PathBuf };

use crate::error::LprError;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Every image file under `dir`, subdirectories included, sorted by path.
pub fn list_images(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, LprError> {
    let mut found = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_image_path(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Scales to `width` keeping the aspect ratio.
pub fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || w == width {
        return img.clone();
    }
    let height = ((h as f64 * width as f64 / w as f64).round() as u32).max(1);
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Plate text as it can be drawn: ascii only, no surrounding whitespace.
pub fn cleanup_text(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii()).collect::<String>().trim().to_string()
}
