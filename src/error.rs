//! Error types for loading and converting schema descriptions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a description document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Fatal errors during conversion.
///
/// Any of these aborts the whole conversion; no partial document is returned.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unknown schema kind \"{kind}\" at {path}")]
    UnknownSchemaKind { path: String, kind: String },

    #[error("reference \"{reference}\" at {path} does not resolve")]
    MissingReferenceTarget { path: String, reference: String },

    #[error("cannot merge {left} with {right}")]
    IncompatibleMerge { left: String, right: String },

    #[error("invalid description at {path}: {message}")]
    InvalidDescription { path: String, message: String },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }

    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        ConvertError::InvalidDescription {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(path: &str, reference: impl Into<String>) -> Self {
        ConvertError::MissingReferenceTarget {
            path: path.to_string(),
            reference: reference.into(),
        }
    }
}
