//
// models.rs
// Dicom-Convert-rs
//
// Plain data types shared by the decoder, the normalizer, the encoder and both front ends.
//

use std::fmt;

use clap::ValueEnum;
use ndarray::Array2;

/// Raw samples of a single-frame, single-channel image, widened to `f64`.
pub type PixelGrid = Array2<f64>;

/// Display-ready 8-bit samples with the same shape as the source grid.
pub type NormalizedGrid = Array2<u8>;

/// A possibly multi-valued numeric attribute such as Window Center.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowValue {
    Scalar(f64),
    List(Vec<f64>),
}

impl WindowValue {
    /// Builds a value from the parsed attribute; `None` when it carries no numbers.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(WindowValue::Scalar),
            _ => Some(WindowValue::List(values)),
        }
    }

    /// Only the first value of a multi-valued attribute is honoured.
    pub fn first(&self) -> Option<f64> {
        match self {
            WindowValue::Scalar(v) => Some(*v),
            WindowValue::List(values) => values.first().copied(),
        }
    }
}

/// VOI window in raw pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub center: f64,
    pub width: f64,
}

impl WindowSpec {
    pub fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }

    /// Lower and upper clipping bounds, `center ∓ width / 2`.
    pub fn bounds(&self) -> (f64, f64) {
        let half = self.width / 2.0;
        (self.center - half, self.center + half)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotometricPolarity {
    #[default]
    Normal,
    Inverted,
}

impl PhotometricPolarity {
    /// MONOCHROME1 renders low values bright; everything else is displayed as-is.
    pub fn from_interpretation(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("MONOCHROME1") => PhotometricPolarity::Inverted,
            _ => PhotometricPolarity::Normal,
        }
    }
}

/// Optional display attributes read from the decoded dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DicomMetadata {
    pub window_center: Option<WindowValue>,
    pub window_width: Option<WindowValue>,
    pub photometric_interpretation: Option<String>,
}

impl DicomMetadata {
    /// Windowing applies only when both center and width are present.
    pub fn window(&self) -> Option<WindowSpec> {
        let center = self.window_center.as_ref()?.first()?;
        let width = self.window_width.as_ref()?.first()?;
        Some(WindowSpec::new(center, width))
    }

    pub fn polarity(&self) -> PhotometricPolarity {
        PhotometricPolarity::from_interpretation(self.photometric_interpretation.as_deref())
    }
}

/// Target raster format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_valued_window_uses_first_entry() {
        let meta = DicomMetadata {
            window_center: WindowValue::from_values(vec![40.0, 300.0]),
            window_width: WindowValue::from_values(vec![400.0, 1500.0]),
            photometric_interpretation: None,
        };
        assert_eq!(meta.window(), Some(WindowSpec::new(40.0, 400.0)));
    }

    #[test]
    fn window_requires_both_attributes() {
        let meta = DicomMetadata {
            window_center: WindowValue::from_values(vec![40.0]),
            window_width: None,
            photometric_interpretation: None,
        };
        assert_eq!(meta.window(), None);
        assert_eq!(WindowValue::from_values(Vec::new()), None);
    }

    #[test]
    fn only_monochrome1_is_inverted() {
        assert_eq!(
            PhotometricPolarity::from_interpretation(Some("MONOCHROME1 ")),
            PhotometricPolarity::Inverted
        );
        assert_eq!(
            PhotometricPolarity::from_interpretation(Some("MONOCHROME2")),
            PhotometricPolarity::Normal
        );
        assert_eq!(
            PhotometricPolarity::from_interpretation(None),
            PhotometricPolarity::Normal
        );
    }

    #[test]
    fn window_bounds_are_centered() {
        assert_eq!(WindowSpec::new(1000.0, 2000.0).bounds(), (0.0, 2000.0));
    }
}
