use image::ImageError;
use rusty_tesseract::TessError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;
use std::path::PathBuf;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug)]
pub enum LprErrorKind {
    IOError(IOError),
    ImageError(ImageError),
    OcrError(TessError),
    OcrInput(String),
    InvalidFont(PathBuf),
    InvalidConfig(String),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::InvalidConfig(msg.into()))
    }

    pub fn ocr_input(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::OcrInput(msg.into()))
    }

    pub fn invalid_font(path: impl Into<PathBuf>) -> Self {
        Self(LprErrorKind::InvalidFont(path.into()))
    }
}

impl<T> From<T> for LprError
where T:  Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            LprErrorKind::IOError(e) => e.fmt(f),
            LprErrorKind::ImageError(e) => e.fmt(f),
            LprErrorKind::OcrError(e) => write!(f, "ocr failed: {}", e),
            LprErrorKind::OcrInput(msg) => write!(f, "cannot hand image to ocr: {}", msg),
            LprErrorKind::InvalidFont(path) => write!(f, "not a usable TrueType font: {}", path.display()),
            LprErrorKind::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl Error for LprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            LprErrorKind::IOError(e) => Some(e),
            LprErrorKind::ImageError(e) => Some(e),
            LprErrorKind::OcrError(e) => Some(e),
            LprErrorKind::OcrInput(_) | LprErrorKind::InvalidFont(_) | LprErrorKind::InvalidConfig(_) => None,
        }
    }
}

impl From<IOError> for LprErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<ImageError> for LprErrorKind {
    fn from(e: ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<TessError> for LprErrorKind {
    fn from(e: TessError) -> Self {
        Self::OcrError(e)
    }
}
