// SubsetDataset and train_test_split — seeded partitioning over borrowed views

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::{Dataset, Sample};
use crate::error::{DataError, Result};

/// A view over a subset of another dataset's indices.
///
/// Borrows the base dataset and owns nothing but its index vector, so
/// splitting never copies samples.
pub struct SubsetDataset<'a> {
    inner: &'a dyn Dataset,
    indices: Vec<usize>,
}

impl std::fmt::Debug for SubsetDataset<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsetDataset")
            .field("inner_len", &self.inner.len())
            .field("indices", &self.indices)
            .finish()
    }
}

impl<'a> SubsetDataset<'a> {
    pub fn new(inner: &'a dyn Dataset, indices: Vec<usize>) -> Self {
        SubsetDataset { inner, indices }
    }

    /// Indices into the base dataset, in view order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl Dataset for SubsetDataset<'_> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let base = *self
            .indices
            .get(index)
            .ok_or(DataError::IndexOutOfBounds {
                index,
                len: self.indices.len(),
            })?;
        self.inner.get(base)
    }

    fn name(&self) -> &str {
        "subset"
    }
}

/// Split `dataset` into disjoint train and test views.
///
/// Indices `[0, len)` are shuffled with a generator seeded from `seed`; the
/// first `round(train_fraction * len)` become the train view, the rest the
/// test view. Together the views cover the dataset exactly once.
pub fn train_test_split(
    dataset: &dyn Dataset,
    train_fraction: f64,
    seed: u64,
) -> Result<(SubsetDataset<'_>, SubsetDataset<'_>)> {
    let n = dataset.len();
    if n == 0 {
        return Err(DataError::InvalidSplit {
            detail: "cannot split an empty dataset".to_string(),
        });
    }
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(DataError::InvalidSplit {
            detail: format!("train fraction {train_fraction} outside (0, 1)"),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = (train_fraction * n as f64).round() as usize;
    let test = indices.split_off(n_train);
    Ok((
        SubsetDataset::new(dataset, indices),
        SubsetDataset::new(dataset, test),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RangeDataset(usize);

    impl Dataset for RangeDataset {
        fn len(&self) -> usize {
            self.0
        }

        fn get(&self, index: usize) -> Result<Sample> {
            if index >= self.0 {
                return Err(DataError::IndexOutOfBounds {
                    index,
                    len: self.0,
                });
            }
            Ok(Sample {
                pixels: vec![index as f32],
                shape: [1, 1, 1],
                label: index,
            })
        }
    }

    #[test]
    fn test_split_sizes() {
        let ds = RangeDataset(10);
        let (train, test) = train_test_split(&ds, 0.7, 37).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_split_rounds() {
        let ds = RangeDataset(10);
        let (train, test) = train_test_split(&ds, 0.75, 37).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_partition_is_exact() {
        let ds = RangeDataset(23);
        let (train, test) = train_test_split(&ds, 0.6, 5).unwrap();
        let mut all: Vec<usize> = train
            .indices()
            .iter()
            .chain(test.indices())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_subset_resolves_base_indices() {
        let ds = RangeDataset(10);
        let (train, _) = train_test_split(&ds, 0.5, 1).unwrap();
        for i in 0..train.len() {
            let sample = train.get(i).unwrap();
            assert_eq!(sample.label, train.indices()[i]);
        }
        assert!(train.get(train.len()).is_err());
    }

    #[test]
    fn test_same_seed_same_split() {
        let ds = RangeDataset(50);
        let (a, _) = train_test_split(&ds, 0.7, 37).unwrap();
        let (b, _) = train_test_split(&ds, 0.7, 37).unwrap();
        assert_eq!(a.indices(), b.indices());
    }

    #[test]
    fn test_different_seed_different_split() {
        let ds = RangeDataset(50);
        let (a, _) = train_test_split(&ds, 0.7, 37).unwrap();
        let (b, _) = train_test_split(&ds, 0.7, 38).unwrap();
        assert_ne!(a.indices(), b.indices());
    }

    #[test]
    fn test_empty_dataset_is_invalid() {
        let ds = RangeDataset(0);
        let err = train_test_split(&ds, 0.7, 0).unwrap_err();
        assert!(matches!(err, DataError::InvalidSplit { .. }));
    }

    #[test]
    fn test_fraction_bounds() {
        let ds = RangeDataset(10);
        for f in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            assert!(train_test_split(&ds, f, 0).is_err(), "fraction {f}");
        }
    }
}
