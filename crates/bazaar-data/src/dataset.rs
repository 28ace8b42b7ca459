// Dataset trait — indexed access to labeled samples

use crate::error::Result;

/// One decoded training example: CHW pixel data plus its encoded label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Pixel values in planar channel-height-width order.
    pub pixels: Vec<f32>,
    /// Shape of `pixels` as `[channels, height, width]`.
    pub shape: [usize; 3],
    /// Encoded class id in `[0, num_classes)`.
    pub label: usize,
}

impl Sample {
    /// Number of pixel values, `channels * height * width`.
    pub fn num_values(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Indexed access to labeled samples.
///
/// `get` is fallible: datasets backed by files surface missing or corrupt
/// inputs instead of substituting placeholder samples. Nothing is read until
/// `get` is called.
pub trait Dataset: Send + Sync {
    /// Number of samples.
    fn len(&self) -> usize;

    /// True when the dataset holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the sample at `index`.
    fn get(&self, index: usize) -> Result<Sample>;

    /// Short name used in messages.
    fn name(&self) -> &str {
        "dataset"
    }
}

impl<D: Dataset + ?Sized> Dataset for &D {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        (**self).get(index)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
