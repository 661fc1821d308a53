//! Error types for the report pipeline

use std::path::PathBuf;

use efr_latex::CompileFailure;
use thiserror::Error;

/// Errors from the document/style store
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document with this id
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Id contains characters that cannot be used in a file name
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    /// Stored house style could not be parsed or failed validation
    #[error("Invalid house style: {0}")]
    InvalidStyle(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// House style validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    /// Colour is not a `#rrggbb` hex value
    #[error("{field} must be a #rrggbb colour, got {value:?}")]
    InvalidColor { field: &'static str, value: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Explicitly requested config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// TOML syntax or schema error
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be written as TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a compile request that starts from the store
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document or style could not be read
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Compilation ran and failed
    #[error(transparent)]
    Compile(#[from] CompileFailure),
}

impl PipelineError {
    /// Message suitable for showing to the document author
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Store(StoreError::DocumentNotFound(id)) => {
                format!("Document {} does not exist.", id)
            }
            PipelineError::Store(e) => e.to_string(),
            PipelineError::Compile(failure) => failure.user_message(),
        }
    }
}
