use std::path::PathBuf;

use crate::error::LprError;

/// Highest page segmentation mode tesseract knows about.
pub const MAX_PSM: u32 = 13;

/// Per run parameters, fixed before the first image is read.
#[derive(Debug, Clone, PartialEq)]
pub struct LprConfig {
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub candidate_count: usize,
    /// tesseract page segmentation mode, 7 = single text line
    pub psm: u32,
    pub lang: String,
    pub clear_border: bool,
    pub debug: bool,
    pub debug_dir: Option<PathBuf>,
    /// width every input is resized to before detection
    pub resize_width: u32,
}

impl Default for LprConfig {
    fn default() -> Self {
        Self {
            min_aspect_ratio: 4.0,
            max_aspect_ratio: 5.0,
            candidate_count: 5,
            psm: 7,
            lang: "eng".to_string(),
            clear_border: false,
            debug: false,
            debug_dir: None,
            resize_width: 600,
        }
    }
}

impl LprConfig {

    pub fn validate(&self) -> Result<(), LprError> {
        let (min, max) = (self.min_aspect_ratio, self.max_aspect_ratio);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || max <= 0.0 {
            return Err(LprError::invalid_config(format!(
                "aspect ratios must be positive, got [{}, {}]", min, max)));
        }
        if min > max {
            return Err(LprError::invalid_config(format!(
                "min aspect ratio {} is above max aspect ratio {}", min, max)));
        }
        if self.candidate_count == 0 {
            return Err(LprError::invalid_config("candidate count must be at least 1"));
        }
        if self.psm > MAX_PSM {
            return Err(LprError::invalid_config(format!(
                "psm must be in 0..={}, got {}", MAX_PSM, self.psm)));
        }
        if self.resize_width == 0 {
            return Err(LprError::invalid_config("resize width must be at least 1"));
        }
        if self.lang.trim().is_empty() {
            return Err(LprError::invalid_config("ocr language is empty"));
        }
        Ok(())
    }

    pub fn accepts_aspect_ratio(&self, ratio: f32) -> bool {
        self.min_aspect_ratio <= ratio && ratio <= self.max_aspect_ratio
    }
}
