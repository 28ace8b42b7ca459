use std::path::PathBuf;

/// Errors produced while building or reading datasets.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A label that was not part of the labels the codec was built from.
    #[error("unknown label {label:?}")]
    UnknownLabel { label: String },

    /// A class id outside `[0, num_classes)`.
    #[error("class id {id} out of range for {num_classes} classes")]
    UnknownClassId { id: usize, num_classes: usize },

    /// An index outside `[0, len)`.
    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The backing image file is missing or undecodable.
    #[error("sample {index}: cannot load image {path:?}: {detail}")]
    ImageLoad {
        index: usize,
        path: PathBuf,
        detail: String,
    },

    /// The manifest file could not be parsed.
    #[error("manifest line {line}: {detail}")]
    Manifest { line: usize, detail: String },

    /// A split request that cannot be satisfied.
    #[error("invalid split: {detail}")]
    InvalidSplit { detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Msg(String),
}

impl DataError {
    /// Shorthand for a free-form error message.
    pub fn msg(s: impl Into<String>) -> Self {
        DataError::Msg(s.into())
    }
}

/// Result alias used across the data crate.
pub type Result<T> = std::result::Result<T, DataError>;
