//! Error handling for instrument file decoding and variable correlation.
//!
//! Every variant carries the offending path, identifier or column so a bad
//! file or a mismatched lookup table can be traced from the message alone.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File or directory not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported file format '{token}' (expected one of: DTA, EC-Lab, Greenlight)")]
    UnsupportedFormat { token: String },

    #[error("Could not decode file: {path} - {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Column '{column}' not found: {context}")]
    MissingColumn { column: String, context: String },

    #[error("Value for variable '{variable}' not found for '{identifier}': {detail}")]
    VariableNotFound {
        variable: String,
        identifier: String,
        detail: String,
    },

    #[error("Could not merge '{identifier}' with correlation table: {reason}")]
    MergeAmbiguity { identifier: String, reason: String },

    #[error("Electrode area not available: {reason}")]
    MissingElectrodeArea { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EchemError {
    /// Decode error for `path` with a formatted reason
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EchemError>;
