//
// image.rs
// Dicom-Convert-rs
//
// Encodes normalized 8-bit grayscale grids as JPEG or PNG bytes.
//

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{ExtendedColorType, ImageEncoder};

use crate::error::Result;
use crate::models::{NormalizedGrid, OutputFormat};

/// Highest JPEG quality; conversions favour fidelity over size.
pub const JPEG_QUALITY: u8 = 100;

/// PNG is lossless at any level, so the cheapest compression is used.
pub const PNG_COMPRESSION: CompressionType = CompressionType::Fast;

/// Encodes the grid as single-channel (L8) image bytes.
pub fn encode(grid: &NormalizedGrid, format: OutputFormat) -> Result<Vec<u8>> {
    let (rows, columns) = grid.dim();
    let (width, height) = match (u32::try_from(columns), u32::try_from(rows)) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => (width, height),
        _ => return Err(dimension_error().into()),
    };
    // Row-major order regardless of the array's memory layout.
    let pixels: Vec<u8> = grid.iter().copied().collect();

    let mut buffer = Vec::new();
    match format {
        OutputFormat::Jpg => JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
            .write_image(&pixels, width, height, ExtendedColorType::L8)?,
        OutputFormat::Png => {
            PngEncoder::new_with_quality(&mut buffer, PNG_COMPRESSION, FilterType::Adaptive)
                .write_image(&pixels, width, height, ExtendedColorType::L8)?
        }
    }
    Ok(buffer)
}

fn dimension_error() -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    ))
}
