//
// error.rs
// Dicom-Convert-rs
//
// Error types for the conversion pipeline and their coarse classification.
//

use thiserror::Error;

/// Coarse failure classes reported to users of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotReadable,
    NoPixelData,
    EncodeFailure,
    RequestMalformed,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a readable DICOM file: {0}")]
    Unreadable(#[from] dicom_object::ReadError),

    #[error("failed to build file meta group: {0}")]
    FileMeta(String),

    #[error("no pixel data found")]
    NoPixelData,

    #[error("failed to decode pixel data: {0}")]
    PixelDecode(#[from] dicom_pixeldata::Error),

    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Io(_)
            | ConvertError::Unreadable(_)
            | ConvertError::FileMeta(_)
            | ConvertError::PixelDecode(_) => ErrorKind::FileNotReadable,
            ConvertError::NoPixelData => ErrorKind::NoPixelData,
            ConvertError::UnsupportedLayout(_) | ConvertError::Encode(_) => {
                ErrorKind::EncodeFailure
            }
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
