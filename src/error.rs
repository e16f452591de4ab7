//! Error type shared by the estimator core, the frequency data shell and the driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AreaDamageError>;

#[derive(Error, Debug)]
pub enum AreaDamageError {
    /// Rejected at the API boundary instead of producing NaN/Inf downstream.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to read {}: {source}", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data in {}: {message}", .path.display())]
    MalformedData { path: PathBuf, message: String },

    #[error("bucket ({hit}, {ring}) is outside the frequency table")]
    OutOfRange { hit: usize, ring: usize },

    /// Every bucket of the frequency table has zero weight.
    #[error("frequency table has no observations; expected damage ratio is undefined")]
    DegenerateAggregate,

    #[error("failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse scenario config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl AreaDamageError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedData {
            path: path.into(),
            message: message.into(),
        }
    }
}
