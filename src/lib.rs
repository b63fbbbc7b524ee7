use image::{ DynamicImage, GrayImage };
use imageproc::contours::Contour;
use imageproc::distance_transform::Norm;
use imageproc::filter;
use imageproc::morphology;
use imageproc::rect::Rect;
use log::{ debug, warn };

use crate::config::LprConfig;
use crate::debug::Debugger;
use crate::error::LprError;
use crate::image_process::RectKernel;
use crate::ocr::{ OcrEngine, OcrOptions, TesseractEngine };

pub mod annotate;
pub mod config;
pub mod debug;
pub mod error;
pub mod image_process;
pub mod ocr;
pub mod utils;


/// Wide and short, roughly one row of plate characters at 600px width.
pub const PLATE_KERNEL: RectKernel = RectKernel::new(13, 5);
const SQUARE_KERNEL: RectKernel = RectKernel::new(3, 3);
// sigma opencv derives for a 5x5 gaussian
const BLUR_SIGMA: f32 = 1.1;
const CLEAN_ITERATIONS: u8 = 2;

/// What one image produced. Text and contour are both set or both absent.
#[derive(Debug)]
pub struct PlateReading {
    pub text: Option<String>,
    pub contour: Option<Contour<i32>>,
    pub bounding_box: Option<Rect>,
}

impl PlateReading {
    pub fn none() -> Self {
        Self { text: None, contour: None, bounding_box: None }
    }

    pub fn is_found(&self) -> bool {
        self.contour.is_some()
    }
}

/// Classical license plate reader: morphology and gradients to find the
/// plate, OCR to read it.
pub struct Lpr<E = TesseractEngine> {
    config: LprConfig,
    ocr: E,
    debugger: Debugger,
}

impl Lpr<TesseractEngine> {

    pub fn new(config: LprConfig) -> Result<Self, LprError> {
        Self::with_engine(config, TesseractEngine)
    }
}

impl<E: OcrEngine> Lpr<E> {

    pub fn with_engine(config: LprConfig, ocr: E) -> Result<Self, LprError> {
        config.validate()?;
        let debugger = Debugger::from_config(&config);
        Ok(Lpr { config, ocr, debugger })
    }

    /// Read one image. An image without a plate is not an error, it gives
    /// `PlateReading::none()`.
    pub fn find_and_extract_text(&self, img: &DynamicImage) -> PlateReading {
        let gray = img.to_luma8();
        let candidates = self.find_candidate_regions(&gray);
        debug!("{} plate candidates", candidates.len());

        let (roi, contour) = match self.locate_license_plate(&gray, &candidates) {
            Some(found) => found,
            None => return PlateReading::none(),
        };
        let text = self.extract_text(&roi);
        self.debugger.show("License Plate Region Of Interest", &roi, true);

        let bounding_box = image_process::bounding_rect(&contour.points);
        PlateReading { text: Some(text), contour: Some(contour), bounding_box }
    }

    /// Up to `candidate_count` external contours of regions that are both
    /// dense in vertical edges and light, largest area first.
    pub fn find_candidate_regions(&self, gray: &GrayImage) -> Vec<Contour<i32>> {
        let black_hat = image_process::black_hat(gray, PLATE_KERNEL);
        self.debugger.show("Black Hat", &black_hat, true);

        let light_regions = image_process::close_rect(gray, SQUARE_KERNEL);
        let light_regions = image_process::otsu_binarize(&light_regions);
        self.debugger.show("Light Regions", &light_regions, true);

        let gradient_x = image_process::normalized_gradient_x(&black_hat);
        self.debugger.show("Scharr Filter on X axis", &gradient_x, true);

        let gradient_x = filter::gaussian_blur_f32(&gradient_x, BLUR_SIGMA);
        let gradient_x = image_process::close_rect(&gradient_x, PLATE_KERNEL);
        let mask = image_process::otsu_binarize(&gradient_x);
        self.debugger.show("Threshold on the Gradient X image", &mask, true);

        let mask = morphology::erode(&mask, Norm::LInf, CLEAN_ITERATIONS);
        let mask = morphology::dilate(&mask, Norm::LInf, CLEAN_ITERATIONS);
        self.debugger.show("Threshold GradientX Image after Erode & Dilate", &mask, true);

        let mask = image_process::mask_and(&mask, &light_regions);
        let mask = morphology::dilate(&mask, Norm::LInf, CLEAN_ITERATIONS);
        let mask = morphology::erode(&mask, Norm::LInf, CLEAN_ITERATIONS);
        self.debugger.show("Final Image", &mask, true);

        let mut scored: Vec<(f64, Contour<i32>)> = image_process::external_contours(&mask)
            .into_iter()
            .map(|c| (image_process::contour_area(&c.points), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter()
            .take(self.config.candidate_count)
            .map(|(_, c)| c)
            .collect()
    }

    /// First candidate, in the given order, whose bounding box fits the
    /// aspect ratio window. Returns the binarized crop and that contour.
    pub fn locate_license_plate(&self, gray: &GrayImage, candidates: &[Contour<i32>]) -> Option<(GrayImage, Contour<i32>)> {
        for candidate in candidates {
            let rect = match image_process::bounding_rect(&candidate.points) {
                Some(rect) => rect,
                None => continue,
            };
            let ratio = image_process::aspect_ratio(&rect);
            if !self.config.accepts_aspect_ratio(ratio) {
                debug!("rejected candidate {}x{} at ({}, {}), ratio {:.2}",
                    rect.width(), rect.height(), rect.left(), rect.top(), ratio);
                continue;
            }
            debug!("plate at ({}, {}) {}x{}, ratio {:.2}",
                rect.left(), rect.top(), rect.width(), rect.height(), ratio);

            let snip = image_process::crop(gray, &rect);
            self.debugger.show("License Plate Snip", &snip, true);

            let mut roi = image_process::otsu_binarize_inv(&snip);
            if self.config.clear_border {
                roi = image_process::clear_border(&roi);
            }
            self.debugger.show("Region Of Interest", &roi, true);
            let contour = Contour {
                points: candidate.points.clone(),
                border_type: candidate.border_type,
                parent: candidate.parent,
            };
            return Some((roi, contour));
        }
        None
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions::new(self.config.psm, self.config.lang.clone())
    }

    /// Text of the plate, only `[A-Z0-9]`. An OCR failure reads as empty.
    pub fn extract_text(&self, roi: &GrayImage) -> String {
        let options = self.ocr_options();
        match self.ocr.recognize(roi, &options) {
            Ok(text) => ocr::restrict_to_whitelist(&text, &options.whitelist),
            Err(e) => {
                warn!("ocr failed, treating plate as unreadable: {}", e);
                String::new()
            }
        }
    }
}
