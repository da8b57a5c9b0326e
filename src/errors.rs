// glaciertool/src/errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failure that stops a pipeline early.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Object storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

/// Missing or malformed settings. Always raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bucket name is required")]
    MissingBucket,

    #[error("region name is required")]
    MissingRegion,

    #[error("access key and secret key are required")]
    MissingCredentials,

    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {reason}")]
    File { path: PathBuf, reason: String },
}

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("failed to list bucket '{bucket}': {message}")]
    List { bucket: String, message: String },

    #[error("failed to restore '{key}': {message}")]
    Restore { key: String, message: String },

    #[error("invalid restore request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Provider message without the wrapping context, as written to report rows.
    pub fn message(&self) -> &str {
        match self {
            StoreError::List { message, .. } | StoreError::Restore { message, .. } => message,
            StoreError::InvalidRequest(message) => message,
        }
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to create report file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
