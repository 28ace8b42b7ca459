// DataLoader — batching, shuffling, iteration

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};
use rayon::prelude::*;

use crate::dataset::{Dataset, Sample};
use crate::error::Result;
use crate::transform::Transform;

/// Loader knobs. Defaults match the catalog training recipe.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Samples per batch.
    pub batch_size: usize,
    /// Draw a fresh index permutation at the start of every epoch.
    pub shuffle: bool,
    /// Drop the final short batch instead of yielding it.
    pub drop_last: bool,
    /// Fetch samples in parallel with rayon when > 0.
    pub num_workers: usize,
    /// Seed for the permutation generator; `None` uses thread randomness.
    pub seed: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            batch_size: 50,
            shuffle: true,
            drop_last: false,
            num_workers: 0,
            seed: None,
        }
    }
}

impl LoaderConfig {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Samples stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Flat pixel data, `len() * product(sample_shape)` values.
    pub pixels: Vec<f32>,
    /// Per-sample CHW shape.
    pub sample_shape: [usize; 3],
    /// Encoded labels, one per sample.
    pub labels: Vec<usize>,
}

impl Batch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Pixel slice for sample `i`.
    pub fn sample_pixels(&self, i: usize) -> &[f32] {
        let n: usize = self.sample_shape.iter().product();
        &self.pixels[i * n..(i + 1) * n]
    }
}

/// Stack samples into a batch. All samples must share one shape.
pub(crate) fn collate(samples: Vec<Sample>) -> Batch {
    let sample_shape = samples.first().map(|s| s.shape).unwrap_or([0, 0, 0]);
    let mut pixels =
        Vec::with_capacity(samples.len() * sample_shape.iter().product::<usize>());
    let mut labels = Vec::with_capacity(samples.len());
    for s in &samples {
        pixels.extend_from_slice(&s.pixels);
        labels.push(s.label);
    }
    Batch {
        pixels,
        sample_shape,
        labels,
    }
}

/// Assembles shuffled batches from a dataset view.
///
/// The loader owns its view (commonly a [`SubsetDataset`] borrowing the base
/// dataset) plus the epoch permutation state. A seeded loader holds one
/// generator that advances across epochs: every epoch draws a fresh
/// permutation, and the whole sequence of permutations replays from the seed.
///
/// [`SubsetDataset`]: crate::split::SubsetDataset
pub struct DataLoader<'a> {
    dataset: Box<dyn Dataset + 'a>,
    config: LoaderConfig,
    transforms: Vec<Box<dyn Transform>>,
    indices: Vec<usize>,
    rng: Option<StdRng>,
}

impl std::fmt::Debug for DataLoader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("dataset_len", &self.dataset.len())
            .field("config", &self.config)
            .field("transforms", &self.transforms.len())
            .field("indices", &self.indices)
            .field("rng", &self.rng)
            .finish()
    }
}

impl<'a> DataLoader<'a> {
    pub fn new<D: Dataset + 'a>(dataset: D, config: LoaderConfig) -> Self {
        let indices = (0..dataset.len()).collect();
        let rng = config.seed.map(StdRng::seed_from_u64);
        DataLoader {
            dataset: Box::new(dataset),
            config,
            transforms: Vec::new(),
            indices,
            rng,
        }
    }

    /// Attach a per-sample transform, applied after fetch in registration
    /// order.
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Samples in the underlying view.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Batches per epoch.
    pub fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.config.drop_last {
            n / self.config.batch_size
        } else {
            n.div_ceil(self.config.batch_size)
        }
    }

    fn reshuffle(&mut self) {
        if !self.config.shuffle {
            return;
        }
        match &mut self.rng {
            Some(rng) => self.indices.shuffle(rng),
            None => self.indices.shuffle(&mut thread_rng()),
        }
    }

    fn fetch(&self, indices: &[usize]) -> Result<Vec<Sample>> {
        let samples: Vec<Sample> = if self.config.num_workers > 0 {
            indices
                .par_iter()
                .map(|&i| self.dataset.get(i))
                .collect::<Result<_>>()?
        } else {
            indices
                .iter()
                .map(|&i| self.dataset.get(i))
                .collect::<Result<_>>()?
        };
        Ok(samples
            .into_iter()
            .map(|s| self.transforms.iter().fold(s, |s, t| t.apply(s)))
            .collect())
    }

    /// Iterate one epoch of batches, reshuffling first when configured.
    pub fn iter_epoch(&mut self) -> BatchIter<'_, 'a> {
        self.reshuffle();
        BatchIter {
            loader: self,
            cursor: 0,
        }
    }
}

/// Yields `Result<Batch>` for one epoch.
pub struct BatchIter<'l, 'a> {
    loader: &'l DataLoader<'a>,
    cursor: usize,
}

impl Iterator for BatchIter<'_, '_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.loader.indices.len();
        if self.cursor >= n {
            return None;
        }
        let end = (self.cursor + self.loader.config.batch_size).min(n);
        if self.loader.config.drop_last && end - self.cursor < self.loader.config.batch_size {
            self.cursor = n;
            return None;
        }
        let idxs = &self.loader.indices[self.cursor..end];
        self.cursor = end;
        Some(self.loader.fetch(idxs).map(collate))
    }
}
