//! # bazaar-data
//!
//! Data plumbing for the product-image classifier:
//!
//! - [`Manifest`]: the cleaned catalog table (product id, category label,
//!   image path).
//! - [`LabelCodec`]: category name <-> dense class id bijection.
//! - [`ProductImageDataset`]: lazy decode of `<id>_resized.jpg` files into
//!   normalized CHW samples, behind the [`Dataset`] trait.
//! - [`train_test_split`] / [`SubsetDataset`]: seeded disjoint index views.
//! - [`DataLoader`] / [`PrefetchLoader`]: shuffled batch assembly with
//!   optional parallel fetch and background prefetch.
//! - [`Transform`] / [`RandomHorizontalFlip`]: per-sample hooks; stochastic
//!   augmentation belongs on the training loader only.

pub mod augment;
pub mod dataset;
pub mod error;
pub mod images;
pub mod labels;
pub mod loader;
pub mod manifest;
pub mod prefetch;
pub mod split;
pub mod transform;

pub use augment::{RandomHorizontalFlip, DEFAULT_FLIP_PROB};
pub use dataset::{Dataset, Sample};
pub use error::{DataError, Result};
pub use images::{
    ProductImageDataset, ProductImageDatasetBuilder, DEFAULT_IMAGE_SIZE, IMAGENET_MEAN,
    IMAGENET_STD,
};
pub use labels::LabelCodec;
pub use loader::{Batch, BatchIter, DataLoader, LoaderConfig};
pub use manifest::{Manifest, ManifestConfig, ManifestEntry};
pub use prefetch::{PrefetchBatches, PrefetchConfig, PrefetchLoader};
pub use split::{train_test_split, SubsetDataset};
pub use transform::{ChannelNormalize, Compose, Transform};
