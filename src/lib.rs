//
// lib.rs
// Dicom-Convert-rs
//
// Exposes the conversion pipeline and both front ends (batch CLI and HTTP service).
//

pub mod batch;
pub mod cli;
pub mod convert;
pub mod decode;
pub mod dicom_access;
pub mod error;
pub mod image;
pub mod models;
pub mod normalize;
pub mod web;

pub use cli::{run as run_cli, Cli, Commands};
pub use convert::{convert_bytes, convert_file};
pub use error::{ConvertError, ErrorKind};
