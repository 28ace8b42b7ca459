/// Errors produced while recording or rendering diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Paired inputs of unequal length.
    #[error("length mismatch ({what}): expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A class id outside the labeled class set.
    #[error("class id {id} out of range for {num_classes} classes")]
    ClassOutOfRange { id: usize, num_classes: usize },

    /// An explicit step that does not advance its stream.
    #[error("step {step} for stream {stream:?} is not after {last}")]
    NonMonotonicStep {
        stream: String,
        step: u64,
        last: u64,
    },

    /// A chart backend failure.
    #[error("render failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the reporting crate.
pub type Result<T> = std::result::Result<T, ReportError>;

pub(crate) fn render_err(e: impl std::fmt::Display) -> ReportError {
    ReportError::Render(e.to_string())
}
