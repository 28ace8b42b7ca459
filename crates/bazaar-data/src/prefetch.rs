// PrefetchLoader — prefetching loader with background workers
//
// A fixed pool of worker threads decodes and collates batches ahead of the
// consumer, feeding a bounded channel. Epoch semantics match `DataLoader`:
// every index appears exactly once per epoch, with a fresh permutation per
// epoch when shuffling. Batches arrive in completion order, not permutation
// order.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use crate::dataset::{Dataset, Sample};
use crate::error::Result;
use crate::loader::{collate, Batch};
use crate::transform::Transform;

/// Prefetching knobs.
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Samples per batch.
    pub batch_size: usize,
    /// Draw a fresh index permutation at the start of every epoch.
    pub shuffle: bool,
    /// Drop the final short batch instead of yielding it.
    pub drop_last: bool,
    /// Worker threads decoding batches.
    pub num_workers: usize,
    /// Channel capacity, in batches per worker.
    pub prefetch_factor: usize,
    /// Seed for the permutation generator; `None` uses thread randomness.
    pub seed: Option<u64>,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        PrefetchConfig {
            batch_size: 50,
            shuffle: true,
            drop_last: false,
            num_workers: 2,
            prefetch_factor: 2,
            seed: None,
        }
    }
}

impl PrefetchConfig {
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
        self.num_workers = num_workers.max(1);
        self
    }

    pub fn prefetch_factor(mut self, prefetch_factor: usize) -> Self {
        self.prefetch_factor = prefetch_factor.max(1);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn fetch_batch(
    dataset: &dyn Dataset,
    transforms: &[Arc<dyn Transform>],
    indices: &[usize],
) -> Result<Batch> {
    let mut samples = Vec::with_capacity(indices.len());
    for &i in indices {
        let mut sample = dataset.get(i)?;
        for t in transforms {
            sample = t.apply(sample);
        }
        samples.push(sample);
    }
    Ok(collate(samples))
}

/// Prefetching loader over a shared dataset.
pub struct PrefetchLoader {
    dataset: Arc<dyn Dataset>,
    config: PrefetchConfig,
    transforms: Vec<Arc<dyn Transform>>,
    indices: Vec<usize>,
    rng: Option<StdRng>,
}

impl PrefetchLoader {
    pub fn new(dataset: Arc<dyn Dataset>, config: PrefetchConfig) -> Self {
        let indices = (0..dataset.len()).collect();
        let rng = config.seed.map(StdRng::seed_from_u64);
        PrefetchLoader {
            dataset,
            config,
            transforms: Vec::new(),
            indices,
            rng,
        }
    }

    /// Attach a per-sample transform, applied by the workers after fetch.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
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

    /// Start one epoch. Workers run until their batches are drained or the
    /// returned iterator is dropped.
    pub fn iter_epoch(&mut self) -> PrefetchBatches {
        if self.config.shuffle {
            match &mut self.rng {
                Some(rng) => self.indices.shuffle(rng),
                None => self.indices.shuffle(&mut thread_rng()),
            }
        }

        let mut jobs: Vec<Vec<usize>> = Vec::with_capacity(self.num_batches());
        let mut cursor = 0;
        while cursor < self.indices.len() {
            let end = (cursor + self.config.batch_size).min(self.indices.len());
            if self.config.drop_last && end - cursor < self.config.batch_size {
                break;
            }
            jobs.push(self.indices[cursor..end].to_vec());
            cursor = end;
        }
        let remaining = jobs.len();

        let workers = self.config.num_workers.max(1);
        let capacity = workers * self.config.prefetch_factor.max(1);
        let (tx, rx) = mpsc::sync_channel::<Result<Batch>>(capacity);
        let queue = Arc::new(Mutex::new(jobs.into_iter()));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = Arc::clone(&queue);
            let dataset = Arc::clone(&self.dataset);
            let transforms = self.transforms.clone();
            handles.push(thread::spawn(move || loop {
                let job = queue.lock().unwrap().next();
                let Some(indices) = job else { break };
                let batch = fetch_batch(dataset.as_ref(), &transforms, &indices);
                // Send fails when the consumer dropped the iterator.
                if tx.send(batch).is_err() {
                    break;
                }
            }));
        }
        drop(tx);

        PrefetchBatches {
            rx: Some(rx),
            handles,
            remaining,
        }
    }
}

/// Epoch iterator over prefetched batches; joins its workers on drop.
pub struct PrefetchBatches {
    rx: Option<mpsc::Receiver<Result<Batch>>>,
    handles: Vec<thread::JoinHandle<()>>,
    remaining: usize,
}

impl Iterator for PrefetchBatches {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let rx = self.rx.as_ref()?;
        match rx.recv() {
            Ok(batch) => {
                self.remaining -= 1;
                Some(batch)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PrefetchBatches {}

impl Drop for PrefetchBatches {
    fn drop(&mut self) {
        // Dropping the receiver unblocks any worker parked on a full
        // channel, then the joins are clean.
        self.rx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
