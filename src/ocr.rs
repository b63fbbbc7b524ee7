use image::GrayImage;
use log::debug;
use rusty_tesseract::{ image as tess_image, Args, Image };

use std::collections::HashMap;

use crate::error::LprError;

/// Characters a plate can carry, everything else is dropped.
pub const PLATE_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq)]
pub struct OcrOptions {
    pub psm: u32,
    pub lang: String,
    pub whitelist: String,
}

impl OcrOptions {
    pub fn new(psm: u32, lang: impl Into<String>) -> Self {
        Self { psm, lang: lang.into(), whitelist: PLATE_CHARS.to_string() }
    }
}

/// Something that turns a binarized plate crop into text.
pub trait OcrEngine {
    fn recognize(&self, roi: &GrayImage, options: &OcrOptions) -> Result<String, LprError>;
}

/// Tesseract through its command line binary, which must be on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TesseractEngine;

impl OcrEngine for TesseractEngine {
    fn recognize(&self, roi: &GrayImage, options: &OcrOptions) -> Result<String, LprError> {
        let image = Image::from_dynamic_image(&tesseract_input(roi)?)?;
        let mut config_variables = HashMap::new();
        config_variables.insert("tessedit_char_whitelist".to_string(), options.whitelist.clone());
        let args = Args {
            lang: options.lang.clone(),
            config_variables,
            psm: Some(options.psm as i32),
            ..Args::default()
        };
        debug!("tesseract {}", tesseract_config_string(options));
        let text = rusty_tesseract::image_to_string(&image, &args)?;
        Ok(text)
    }
}

/// Copies the crop into the `image` version rusty-tesseract is built on.
pub fn tesseract_input(roi: &GrayImage) -> Result<tess_image::DynamicImage, LprError> {
    let (width, height) = roi.dimensions();
    let buffer = tess_image::GrayImage::from_raw(width, height, roi.as_raw().clone())
        .ok_or_else(|| LprError::ocr_input(format!("{}x{} crop does not fit its buffer", width, height)))?;
    Ok(tess_image::DynamicImage::ImageLuma8(buffer))
}

/// The same settings written the way the tesseract cli takes them.
pub fn tesseract_config_string(options: &OcrOptions) -> String {
    format!("-c tessedit_char_whitelist={} --psm {}", options.whitelist, options.psm)
}

/// Drops every character outside the whitelist, whitespace included.
pub fn restrict_to_whitelist(text: &str, whitelist: &str) -> String {
    text.chars().filter(|c| whitelist.contains(*c)).collect()
}
