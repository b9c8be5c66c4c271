use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;

/// Library error type for kiosk-frame operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured photo directory is missing or not a directory.
    #[error("invalid photo directory: {0}")]
    BadDir(String),

    /// A scan (startup or wrap-time regeneration) found no images.
    #[error("no images found under {}", .0.display())]
    EmptyScan(PathBuf),

    /// A single image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
