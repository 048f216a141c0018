//! Error types for report rendering
//!
//! Configuration problems (missing assets, empty datasets, absent required
//! fields) are reported before any page is produced so that a build never
//! emits a partial document.

use thiserror::Error;

/// Error type for report building and rendering
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing asset file: {0}")]
    MissingAsset(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Unknown page template: {0}")]
    UnknownTemplate(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Dataset error: {0}")]
    Data(#[from] DataError),
}

/// Result type alias for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while loading or validating a dataset
#[derive(Error, Debug)]
pub enum DataError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} references unknown {target}: {key}")]
    MissingReference {
        entity: &'static str,
        target: &'static str,
        key: String,
    },

    #[error("Invalid {entity} {key}: {reason}")]
    Invalid {
        entity: &'static str,
        key: String,
        reason: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for dataset operations
pub type DataResult<T> = Result<T, DataError>;

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::Config(err.to_string())
    }
}

impl From<image::ImageError> for ReportError {
    fn from(err: image::ImageError) -> Self {
        ReportError::ImageError(err.to_string())
    }
}
