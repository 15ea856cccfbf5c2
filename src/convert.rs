//
// convert.rs
// Dicom-Convert-rs
//
// End-to-end pipeline shared by the batch tool and the HTTP service: decode, normalize, encode.
//

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::decode::{self, DecodedImage};
use crate::error::Result;
use crate::image;
use crate::models::{NormalizedGrid, OutputFormat};
use crate::normalize::normalize;

/// Converts an in-memory DICOM file into encoded image bytes.
pub fn convert_bytes(bytes: &[u8], format: OutputFormat) -> Result<Vec<u8>> {
    let decoded = decode::decode(bytes)?;
    let normalized = render(&decoded);
    image::encode(&normalized, format)
}

pub fn convert_file(path: &Path, format: OutputFormat) -> Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    convert_bytes(&bytes, format)
}

/// Applies the stored window (or full-range scaling) and polarity to a decoded image.
pub fn render(decoded: &DecodedImage) -> NormalizedGrid {
    let window = decoded.metadata.window();
    let polarity = decoded.metadata.polarity();
    let (rows, columns) = decoded.grid.dim();
    debug!(rows, columns, ?window, ?polarity, "normalizing pixel data");
    normalize(&decoded.grid, window, polarity)
}
