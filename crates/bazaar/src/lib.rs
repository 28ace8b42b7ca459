//! # bazaar
//!
//! Training-side utilities for the marketplace product-image classifier.
//!
//! | crate | concern |
//! |-------|---------|
//! | `bazaar-data` | manifest, label codec, image dataset, split, loaders |
//! | `bazaar-train` | single-epoch train/validate loops behind model seams |
//! | `bazaar-report` | scalar streams, loss curves, confusion matrices |
//!
//! [`run`] wires them together: [`RunConfig`] fixes the operating point,
//! [`build_loaders`] splits a dataset into an augmented train loader and a
//! deterministic validation loader, and [`Trainer::fit`] drives the epochs
//! while recording per-batch losses.
//!
//! The model, loss function, and optimizer stay on the caller's side of the
//! [`train::Model`], [`train::LossFn`], and [`train::Optimizer`] traits.

pub mod run;

pub use bazaar_data as data;
pub use bazaar_report as report;
pub use bazaar_train as train;

pub use run::{build_loaders, EpochLog, FitResult, RunConfig, Trainer};

/// Everything a training binary typically needs.
pub mod prelude {
    pub use crate::run::{build_loaders, EpochLog, FitResult, RunConfig, Trainer};
    pub use bazaar_data::{
        train_test_split, Batch, ChannelNormalize, DataError, DataLoader, Dataset, LabelCodec,
        LoaderConfig, Manifest, ManifestConfig, ManifestEntry, PrefetchConfig, PrefetchLoader,
        ProductImageDataset, RandomHorizontalFlip, Sample, SubsetDataset, Transform,
        DEFAULT_FLIP_PROB, DEFAULT_IMAGE_SIZE, IMAGENET_MEAN, IMAGENET_STD,
    };
    pub use bazaar_report::{plot_curves, ConfusionMatrix, ScalarRecorder};
    pub use bazaar_train::{
        accuracy, collect_predictions, train_epoch, validate_epoch, EpochReport, Logits, LossFn,
        LossOutput, Mode, Model, Optimizer, TrainError,
    };
}
