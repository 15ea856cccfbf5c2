use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::{DefaultDicomObject, InMemDicomObject};

/// Small helper trait to pull optional attribute values out of a decoded object.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    fn element_floats(&self, tag: Tag) -> Option<Vec<f64>>;
    fn has_element(&self, tag: Tag) -> bool;
}

impl ElementAccess for DefaultDicomObject {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    }

    fn element_floats(&self, tag: Tag) -> Option<Vec<f64>> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_multi_float64().ok())
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim().to_string())
    }

    fn element_floats(&self, tag: Tag) -> Option<Vec<f64>> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_multi_float64().ok())
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }
}
