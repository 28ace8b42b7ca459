use bazaar_data::DataError;

/// Errors produced while running an epoch.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// A loader failure while assembling a batch.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A model, loss, or optimizer failure on one batch. The epoch aborts;
    /// whether to retry is the caller's decision.
    #[error("batch {batch}: {source}")]
    BatchCompute {
        batch: usize,
        #[source]
        source: Box<TrainError>,
    },

    #[error("{0}")]
    Msg(String),
}

impl TrainError {
    /// Shorthand for a free-form error message.
    pub fn msg(s: impl Into<String>) -> Self {
        TrainError::Msg(s.into())
    }

    pub(crate) fn in_batch(batch: usize, source: TrainError) -> Self {
        TrainError::BatchCompute {
            batch,
            source: Box::new(source),
        }
    }
}

/// Result alias used across the training crate.
pub type Result<T> = std::result::Result<T, TrainError>;
