use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::convert;
use crate::error::ConvertError;
use crate::models::OutputFormat;

/// File names ending in one of these are never treated as DICOM candidates.
pub const IGNORED_EXTENSIONS: [&str; 7] = [".gitkeep", ".txt", ".jpg", ".png", ".md", ".py", ".json"];

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit inputs; when set the input directory is not scanned.
    pub files: Option<Vec<PathBuf>>,
    pub format: OutputFormat,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Resolves the inputs described by `options` and converts them one after another.
pub fn run(options: &BatchOptions) -> Result<BatchSummary> {
    ensure_output_dir(&options.output_dir)?;

    let inputs = match &options.files {
        Some(files) => {
            let existing = existing_files(files);
            if existing.is_empty() {
                warn!("None of the specified files exist.");
                return Ok(BatchSummary::default());
            }
            existing
        }
        None => {
            if !options.input_dir.is_dir() {
                warn!(
                    "Input directory does not exist: {}",
                    options.input_dir.display()
                );
                return Ok(BatchSummary::default());
            }
            discover_inputs(&options.input_dir)
        }
    };

    if inputs.is_empty() {
        warn!("No valid images found.");
        return Ok(BatchSummary::default());
    }

    let summary = convert_batch(&inputs, &options.output_dir, options.format);
    println!(
        "\nProcessing complete. Converted {} files.",
        summary.converted
    );
    Ok(summary)
}

/// Converts every input independently; failures are logged and counted, never propagated.
pub fn convert_batch(inputs: &[PathBuf], output_dir: &Path, format: OutputFormat) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for input in inputs {
        let output = output_path_for(input, output_dir, format);
        match convert_one(input, &output, format) {
            Ok(()) => {
                info!("Success: {}", output.display());
                summary.converted += 1;
            }
            Err(ConvertError::NoPixelData) => {
                warn!("Skipping {}: No pixel data found.", display_name(input));
                summary.failed += 1;
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", display_name(input), e);
                summary.failed += 1;
            }
        }
    }

    summary
}

fn convert_one(input: &Path, output: &Path, format: OutputFormat) -> Result<(), ConvertError> {
    let bytes = convert::convert_file(input, format)?;
    fs::write(output, bytes)?;
    Ok(())
}

/// Regular files directly inside `dir`, sorted by name, minus known non-DICOM noise.
pub fn discover_inputs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| !is_ignored(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}

pub fn is_ignored(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    IGNORED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// `<output_dir>/<input stem>.<ext>`; an existing file at that path gets overwritten.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .or_else(|| input.file_name())
        .unwrap_or_else(|| OsStr::new("converted"));
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

fn existing_files(files: &[PathBuf]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                warn!("Ignoring missing file: {}", path.display());
            }
            exists
        })
        .cloned()
        .collect()
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    info!("Created directory: {}", dir.display());
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
