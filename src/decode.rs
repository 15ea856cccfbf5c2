//
// decode.rs
// Dicom-Convert-rs
//
// Parses DICOM bytes and extracts the raw pixel grid plus the display attributes used for windowing.
//

use dicom::transfer_syntax::entries::{EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN};
use dicom_dictionary_std::{tags, StandardDataDictionary};
use dicom_object::file::ReadPreamble;
use dicom_object::{
    DefaultDicomObject, FileDicomObject, FileMetaTableBuilder, InMemDicomObject, OpenFileOptions,
};
use dicom_pixeldata::{
    ConvertOptions, DecodedPixelData, ModalityLutOption, PixelDecoder, PixelRepresentation,
};
use ndarray::{Array, Array2, Dimension};

use crate::dicom_access::ElementAccess;
use crate::error::{ConvertError, Result};
use crate::models::{DicomMetadata, PixelGrid, WindowValue};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8] = b"DICM";
/// Secondary Capture Image Storage, used when a bare dataset names no SOP class.
const FALLBACK_SOP_CLASS_UID: &str = "1.2.840.10008.5.1.4.1.1.7";
const FALLBACK_SOP_INSTANCE_UID: &str = "2.25.0";

/// Pixel samples and display attributes of one decoded instance.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub grid: PixelGrid,
    pub metadata: DicomMetadata,
}

/// Decodes a complete DICOM file held in memory.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let obj = read_object(bytes)?;
    let metadata = extract_metadata(&obj);
    let grid = pixel_grid(&obj)?;
    Ok(DecodedImage { grid, metadata })
}

/// Reads a DICOM file with or without the 128-byte preamble.
///
/// Data that carries no `DICM` magic at all is read as a bare dataset (implicit VR
/// little endian, then explicit VR little endian) and given a synthesized file meta group.
pub fn read_object(bytes: &[u8]) -> Result<DefaultDicomObject> {
    match file_body(bytes) {
        Some(body) => {
            let obj = OpenFileOptions::new()
                .read_preamble(ReadPreamble::Never)
                .from_reader(body)?;
            Ok(obj)
        }
        None => read_bare_dataset(bytes),
    }
}

/// The bytes starting at the `DICM` magic, if present at offset 0 or after the preamble.
fn file_body(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.starts_with(MAGIC) {
        return Some(bytes);
    }
    match bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) {
        Some(magic) if magic == MAGIC => Some(&bytes[PREAMBLE_LEN..]),
        _ => None,
    }
}

fn read_bare_dataset(bytes: &[u8]) -> Result<DefaultDicomObject> {
    let (dataset, ts_uid) =
        match InMemDicomObject::read_dataset_with_ts(bytes, &IMPLICIT_VR_LITTLE_ENDIAN.erased()) {
            Ok(dataset) => (dataset, IMPLICIT_VR_LITTLE_ENDIAN.uid()),
            Err(implicit_err) => match InMemDicomObject::read_dataset_with_ts(
                bytes,
                &EXPLICIT_VR_LITTLE_ENDIAN.erased(),
            ) {
                Ok(dataset) => (dataset, EXPLICIT_VR_LITTLE_ENDIAN.uid()),
                Err(_) => return Err(implicit_err.into()),
            },
        };

    let sop_class_uid = dataset
        .element_str(tags::SOP_CLASS_UID)
        .unwrap_or_else(|| FALLBACK_SOP_CLASS_UID.to_string());
    let sop_instance_uid = dataset
        .element_str(tags::SOP_INSTANCE_UID)
        .unwrap_or_else(|| FALLBACK_SOP_INSTANCE_UID.to_string());
    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(ts_uid)
        .media_storage_sop_class_uid(sop_class_uid)
        .media_storage_sop_instance_uid(sop_instance_uid)
        .build()
        .map_err(|e| ConvertError::FileMeta(e.to_string()))?;

    let mut obj = FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
    for elem in dataset {
        obj.put(elem);
    }
    Ok(obj)
}

pub fn extract_metadata<T: ElementAccess>(obj: &T) -> DicomMetadata {
    DicomMetadata {
        window_center: obj
            .element_floats(tags::WINDOW_CENTER)
            .and_then(WindowValue::from_values),
        window_width: obj
            .element_floats(tags::WINDOW_WIDTH)
            .and_then(WindowValue::from_values),
        photometric_interpretation: obj.element_str(tags::PHOTOMETRIC_INTERPRETATION),
    }
}

/// Decodes the pixel data of a single-frame grayscale image into raw sample values.
pub fn pixel_grid(obj: &DefaultDicomObject) -> Result<PixelGrid> {
    if !obj.has_element(tags::PIXEL_DATA) {
        return Err(ConvertError::NoPixelData);
    }
    let decoded = obj.decode_pixel_data()?;

    let frames = decoded.number_of_frames();
    if frames != 1 {
        return Err(ConvertError::UnsupportedLayout(format!(
            "{} frames (only single-frame images are supported)",
            frames
        )));
    }
    let samples_per_pixel = decoded.samples_per_pixel();
    if samples_per_pixel != 1 {
        return Err(ConvertError::UnsupportedLayout(format!(
            "{} samples per pixel (only grayscale is supported)",
            samples_per_pixel
        )));
    }

    let rows = decoded.rows() as usize;
    let columns = decoded.columns() as usize;
    let values = raw_samples(&decoded)?;

    Array2::from_shape_vec((rows, columns), values).map_err(|e| {
        ConvertError::UnsupportedLayout(format!("{}x{} grid: {}", rows, columns, e))
    })
}

fn raw_samples(decoded: &DecodedPixelData<'_>) -> Result<Vec<f64>> {
    // Stored values only: no rescale slope/intercept is applied.
    let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
    let bits_allocated = decoded.bits_allocated();

    let values = if decoded.pixel_representation() == PixelRepresentation::Unsigned {
        if bits_allocated <= 8 {
            widen(decoded.to_ndarray_with_options::<u8>(&options)?)
        } else if bits_allocated <= 16 {
            widen(decoded.to_ndarray_with_options::<u16>(&options)?)
        } else {
            widen(decoded.to_ndarray_with_options::<u32>(&options)?)
        }
    } else if bits_allocated <= 8 {
        widen(decoded.to_ndarray_with_options::<i8>(&options)?)
    } else if bits_allocated <= 16 {
        widen(decoded.to_ndarray_with_options::<i16>(&options)?)
    } else {
        widen(decoded.to_ndarray_with_options::<i32>(&options)?)
    };

    Ok(values)
}

fn widen<T, D>(array: Array<T, D>) -> Vec<f64>
where
    T: Copy + Into<f64>,
    D: Dimension,
{
    array.iter().map(|&v| v.into()).collect()
}
