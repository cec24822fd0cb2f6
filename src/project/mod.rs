//! 3MF project handling
//!
//! A 3MF file is a zip container. Slicers that embed their configuration
//! store it under [`archive::PROJECT_SETTINGS_ENTRY`], either as JSON or as
//! plain `key = value` lines. This module reads that entry, parses it into
//! [`SlicingParameters`] and renders the summary that is shown to the user
//! and handed to the assistant.
pub mod archive;
pub mod format;
pub mod metadata;
pub mod parser;

use std::path::{Path, PathBuf};

use serde_json::Value;

pub use archive::{PROJECT_SETTINGS_ENTRY, read_project_settings, read_project_settings_from_bytes};
pub use format::{NO_PARAMETERS, format_parameters};
pub use metadata::{FileMetadata, format_file_size};
pub use parser::{parse_key_values, parse_settings};

/// Ordered key to value mapping; insertion order is kept for display.
pub type ParameterMap = serde_json::Map<String, Value>;

pub const MISSING_SETTINGS_WARNING: &str = "Could not find slicing parameters in the 3MF file. Make sure the file contains a project_settings.config in the Metadata directory.";
pub const EXTRACTION_FAILED_WARNING: &str =
    "Error extracting slicing parameters from the 3MF file";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to read file: {0}")]
    Io(#[source] std::io::Error),

    #[error("Not a valid 3MF archive: {0}")]
    InvalidArchive(#[source] zip::result::ZipError),

    #[error("Archive has no {0} entry")]
    MissingEntry(String),

    #[error("Failed to read archive entry: {0}")]
    ReadEntry(#[source] std::io::Error),
}

impl ExtractError {
    /// Message shown to the user when a load goes wrong.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractError::Io(_) => EXTRACTION_FAILED_WARNING,
            _ => MISSING_SETTINGS_WARNING,
        }
    }
}

/// Result of parsing the settings entry.
#[derive(Clone, Debug, PartialEq)]
pub enum SlicingParameters {
    /// The entry was valid JSON; the decoded value is kept untouched.
    Structured(Value),
    /// The entry was scanned line by line as `key=value` pairs.
    Flat(ParameterMap),
}

impl SlicingParameters {
    pub fn to_value(&self) -> Value {
        match self {
            SlicingParameters::Structured(value) => value.clone(),
            SlicingParameters::Flat(map) => Value::Object(map.clone()),
        }
    }

    /// True when the entry decoded to nothing worth showing: JSON `null`,
    /// `false`, `0` or an empty string.
    pub fn is_absent(&self) -> bool {
        match self {
            SlicingParameters::Structured(Value::Null | Value::Bool(false)) => true,
            SlicingParameters::Structured(Value::Number(n)) => n.as_f64() == Some(0.0),
            SlicingParameters::Structured(Value::String(s)) => s.is_empty(),
            _ => false,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            SlicingParameters::Structured(value) => format_parameters(Some(value)),
            SlicingParameters::Flat(map) => format_parameters(Some(&Value::Object(map.clone()))),
        }
    }
}

/// Read and parse the slicer settings embedded in a 3MF file.
pub fn extract_slicing_parameters(path: &Path) -> Result<SlicingParameters, ExtractError> {
    let text = read_project_settings(path)?;
    Ok(parse_settings(&text))
}

/// A file the user has chosen, with whatever could be extracted from it.
#[derive(Clone, Debug)]
pub struct LoadedProject {
    pub path: PathBuf,
    pub metadata: Option<FileMetadata>,
    pub parameters: Option<SlicingParameters>,
    pub analysis_error: Option<String>,
}

impl LoadedProject {
    /// Snapshot metadata and extract parameters. Never fails; problems are
    /// recorded in `analysis_error`.
    pub fn load(path: &Path) -> Self {
        let metadata = match FileMetadata::from_path(path) {
            Ok(meta) => Some(meta),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read file metadata");
                None
            }
        };

        let (parameters, analysis_error) = match extract_slicing_parameters(path) {
            Ok(params) if params.is_absent() => (None, Some(MISSING_SETTINGS_WARNING.to_string())),
            Ok(params) => (Some(params), None),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "slicing parameter extraction failed");
                (None, Some(err.user_message().to_string()))
            }
        };

        Self {
            path: path.to_path_buf(),
            metadata,
            parameters,
            analysis_error,
        }
    }

    pub fn summary(&self) -> String {
        match &self.parameters {
            Some(params) => params.summary(),
            None => NO_PARAMETERS.to_string(),
        }
    }
}
