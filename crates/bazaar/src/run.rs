// Run wiring — configuration, loader construction, the multi-epoch driver

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bazaar_data::{
    train_test_split, DataLoader, Dataset, LoaderConfig, RandomHorizontalFlip, DEFAULT_FLIP_PROB,
};
use bazaar_report::ScalarRecorder;
use bazaar_train::{train_epoch, validate_epoch, LossFn, Model, Optimizer, Result};

/// Run-level configuration. Defaults are the catalog operating point.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Samples per batch.
    pub batch_size: usize,
    /// Share of samples assigned to the train split, in (0, 1).
    pub train_fraction: f64,
    /// Master seed; the split, shuffle, and augmentation seeds derive
    /// from it.
    pub seed: u64,
    /// Reshuffle the train split every epoch.
    pub shuffle: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            batch_size: 50,
            train_fraction: 0.7,
            seed: 37,
            shuffle: true,
        }
    }
}

impl RunConfig {
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

/// Split `dataset` per `config` and build the two loaders.
///
/// The train loader carries the horizontal-flip augmentation and reshuffles
/// per epoch; the validation loader is unaugmented and iterates in split
/// order, so validation passes are deterministic.
pub fn build_loaders<'a>(
    dataset: &'a dyn Dataset,
    config: &RunConfig,
) -> bazaar_data::Result<(DataLoader<'a>, DataLoader<'a>)> {
    let mut seeds = StdRng::seed_from_u64(config.seed);
    let split_seed: u64 = seeds.gen();
    let shuffle_seed: u64 = seeds.gen();
    let flip_seed: u64 = seeds.gen();

    let (train_set, val_set) = train_test_split(dataset, config.train_fraction, split_seed)?;
    let train_loader = DataLoader::new(
        train_set,
        LoaderConfig::default()
            .batch_size(config.batch_size)
            .shuffle(config.shuffle)
            .seed(shuffle_seed),
    )
    .with_transform(Box::new(RandomHorizontalFlip::new(
        DEFAULT_FLIP_PROB,
        flip_seed,
    )));
    let val_loader = DataLoader::new(
        val_set,
        LoaderConfig::default()
            .batch_size(config.batch_size)
            .shuffle(false),
    );
    Ok((train_loader, val_loader))
}

/// Per-epoch summary produced by [`Trainer::fit`].
#[derive(Debug, Clone)]
pub struct EpochLog {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Result of a full fit: one log per epoch plus the final training loss.
#[derive(Debug, Clone)]
pub struct FitResult {
    pub epochs: Vec<EpochLog>,
    pub final_loss: f64,
}

impl FitResult {
    pub fn epoch_numbers(&self) -> Vec<usize> {
        self.epochs.iter().map(|e| e.epoch).collect()
    }

    pub fn train_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.train_loss).collect()
    }

    pub fn val_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.val_loss).collect()
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for log in &self.epochs {
            writeln!(
                f,
                "epoch {}: train loss {:.4} acc {:.1}% | val loss {:.4} acc {:.1}%",
                log.epoch, log.train_loss, log.train_accuracy, log.val_loss, log.val_accuracy
            )?;
        }
        write!(f, "final loss: {:.4}", self.final_loss)
    }
}

/// Drives the epoch loop: N rounds of train + validate, feeding per-batch
/// losses into a [`ScalarRecorder`] (`train_loss` and `val_loss` streams,
/// separate step counters).
pub struct Trainer {
    epochs: usize,
    recorder: ScalarRecorder,
}

impl Trainer {
    pub fn new(epochs: usize) -> Self {
        Trainer {
            epochs,
            recorder: ScalarRecorder::new(),
        }
    }

    /// The recorded scalar streams.
    pub fn recorder(&self) -> &ScalarRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> ScalarRecorder {
        self.recorder
    }

    /// Run the configured number of epochs. Any batch failure aborts the
    /// whole fit with the underlying error.
    pub fn fit<M: Model + ?Sized>(
        &mut self,
        model: &mut M,
        optimizer: &mut dyn Optimizer<M>,
        loss_fn: &dyn LossFn,
        train_loader: &mut DataLoader<'_>,
        val_loader: &mut DataLoader<'_>,
    ) -> Result<FitResult> {
        let mut epochs = Vec::with_capacity(self.epochs);
        for epoch in 1..=self.epochs {
            let train = train_epoch(model, train_loader.iter_epoch(), optimizer, loss_fn)?;
            for &loss in &train.batch_losses {
                self.recorder.record_scalar("train_loss", loss);
            }

            let val = validate_epoch(model, val_loader.iter_epoch(), loss_fn)?;
            for &loss in &val.batch_losses {
                self.recorder.record_scalar("val_loss", loss);
            }

            epochs.push(EpochLog {
                epoch,
                train_loss: train.avg_loss,
                train_accuracy: train.accuracy,
                val_loss: val.avg_loss,
                val_accuracy: val.accuracy,
            });
        }
        let final_loss = epochs.last().map_or(0.0, |e| e.train_loss);
        Ok(FitResult { epochs, final_loss })
    }
}
