//! Error types of the data loaders.

use std::path::PathBuf;
use thiserror::Error;

pub type LoaderResult<T> = std::result::Result<T, LoaderError>;

/// The error type of the manifest parser, image decoders and loaders.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("malformed manifest '{}' at line {line}: {reason}", path.display())]
    Manifest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("failed to read manifest '{}': {source}", path.display())]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("batch offset {offset} is out of range for a dataset of {len} samples")]
    OutOfRange { offset: usize, len: usize },

    #[error("the dataset queue is disconnected")]
    Disconnected,

    #[error("failed to spawn loader worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("loader worker '{0}' panicked")]
    WorkerPanicked(String),
}
