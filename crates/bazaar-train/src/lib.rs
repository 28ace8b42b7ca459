//! # bazaar-train
//!
//! Single-epoch train/validate loops for the product classifier. The model,
//! loss function, and optimizer live behind traits supplied by the caller;
//! this crate only drives one pass of batch iteration and accounting:
//!
//! - [`Mode`], [`Model`], [`LossFn`], [`Optimizer`]: the framework seams.
//! - [`train_epoch`]: forward, loss, zero-grad, backward, step per batch;
//!   the only path that mutates parameters.
//! - [`validate_epoch`]: forward-only scoring in eval mode.
//! - [`collect_predictions`]: argmax pass feeding the confusion matrix.

pub mod epoch;
pub mod error;
pub mod metrics;
pub mod model;

pub use epoch::{collect_predictions, train_epoch, validate_epoch, EpochReport};
pub use error::{Result, TrainError};
pub use metrics::accuracy;
pub use model::{Logits, LossFn, LossOutput, Mode, Model, Optimizer};
