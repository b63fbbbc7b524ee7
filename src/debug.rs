use image::GrayImage;
use log::{ debug, warn };

use std::cell::Cell;
use std::path::PathBuf;

use crate::config::LprConfig;

/// Shows intermediate images while the pipeline runs. Does nothing unless
/// debugging is turned on, and never changes what the pipeline returns.
#[derive(Debug, Default)]
pub struct Debugger {
    enabled: bool,
    dump_dir: Option<PathBuf>,
    counter: Cell<usize>,
}

impl Debugger {

    pub fn new(enabled: bool, dump_dir: Option<PathBuf>) -> Self {
        Self { enabled, dump_dir, counter: Cell::new(0) }
    }

    pub fn from_config(config: &LprConfig) -> Self {
        Self::new(config.debug, config.debug_dir.clone())
    }

    /// `wait_key` blocks until the window is closed, only with the
    /// `display-window` feature.
    #[cfg_attr(not(feature = "display-window"), allow(unused_variables))]
    pub fn show(&self, title: &str, image: &GrayImage, wait_key: bool) {
        if !self.enabled {
            return;
        }
        let index = self.counter.get();
        self.counter.set(index + 1);
        debug!("[{:02}] {} ({}x{})", index, title, image.width(), image.height());

        if let Some(dir) = &self.dump_dir {
            let path = dir.join(format!("{:02}_{}.png", index, slug(title)));
            if let Err(e) = image.save(&path) {
                warn!("could not write debug image {}: {}", path.display(), e);
            }
        }

        #[cfg(feature = "display-window")]
        {
            if wait_key && image.width() > 0 && image.height() > 0 {
                let rgba = image::DynamicImage::ImageLuma8(image.clone()).to_rgba8();
                imageproc::window::display_image(title, &rgba, image.width(), image.height());
            }
        }
    }
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}
