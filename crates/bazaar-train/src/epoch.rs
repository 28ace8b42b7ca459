// train_epoch / validate_epoch — one pass over a batch stream
//
// The loop over multiple epochs is the caller's; these functions run exactly
// one pass over whatever batch stream they are handed, so they work unchanged
// with the in-process loader or the prefetching one.

use bazaar_data::Batch;

use crate::error::{Result, TrainError};
use crate::model::{LossFn, Mode, Model, Optimizer};

/// Metrics for one completed pass over a loader.
#[derive(Debug, Clone)]
pub struct EpochReport {
    /// Sum of per-batch losses divided by the number of batches.
    pub avg_loss: f64,
    /// Percentage of samples whose argmax matched the target.
    pub accuracy: f64,
    /// Batches seen.
    pub batches: usize,
    /// Samples seen.
    pub samples: usize,
    /// Loss per batch, in iteration order.
    pub batch_losses: Vec<f64>,
}

fn finish_report(
    batch_losses: Vec<f64>,
    correct: usize,
    samples: usize,
    what: &str,
) -> Result<EpochReport> {
    let batches = batch_losses.len();
    if batches == 0 {
        return Err(TrainError::msg(format!("{what} epoch saw no batches")));
    }
    let avg_loss = batch_losses.iter().sum::<f64>() / batches as f64;
    let accuracy = if samples == 0 {
        0.0
    } else {
        100.0 * correct as f64 / samples as f64
    };
    Ok(EpochReport {
        avg_loss,
        accuracy,
        batches,
        samples,
        batch_losses,
    })
}

fn count_correct(logits: &crate::model::Logits, targets: &[usize]) -> usize {
    logits
        .argmax_classes()
        .iter()
        .zip(targets)
        .filter(|(p, t)| p == t)
        .count()
}

/// One training epoch.
///
/// Per batch: forward in [`Mode::Train`], loss, clear gradients, backward
/// with the loss gradient, optimizer step. The optimizer step is the only
/// point in the system where parameters change. Any failure aborts the
/// epoch; no partial report is returned.
pub fn train_epoch<M, I>(
    model: &mut M,
    batches: I,
    optimizer: &mut dyn Optimizer<M>,
    loss_fn: &dyn LossFn,
) -> Result<EpochReport>
where
    M: Model + ?Sized,
    I: IntoIterator<Item = bazaar_data::Result<Batch>>,
{
    let mut batch_losses = Vec::new();
    let mut correct = 0;
    let mut samples = 0;

    for (batch_idx, batch) in batches.into_iter().enumerate() {
        let batch = batch?;
        let wrap = |e: TrainError| TrainError::in_batch(batch_idx, e);

        let logits = model.forward(&batch, Mode::Train).map_err(wrap)?;
        let loss = loss_fn.compute(&logits, &batch.labels).map_err(wrap)?;
        optimizer.zero_grad(model);
        model.backward(&loss.grad).map_err(wrap)?;
        optimizer.step(model).map_err(wrap)?;

        correct += count_correct(&logits, &batch.labels);
        samples += batch.len();
        batch_losses.push(loss.value);
    }

    finish_report(batch_losses, correct, samples, "training")
}

/// One validation epoch: forward in [`Mode::Eval`] and loss only.
///
/// No gradients, no optimizer, no parameter mutation anywhere on this path.
pub fn validate_epoch<M, I>(model: &mut M, batches: I, loss_fn: &dyn LossFn) -> Result<EpochReport>
where
    M: Model + ?Sized,
    I: IntoIterator<Item = bazaar_data::Result<Batch>>,
{
    let mut batch_losses = Vec::new();
    let mut correct = 0;
    let mut samples = 0;

    for (batch_idx, batch) in batches.into_iter().enumerate() {
        let batch = batch?;
        let wrap = |e: TrainError| TrainError::in_batch(batch_idx, e);

        let logits = model.forward(&batch, Mode::Eval).map_err(wrap)?;
        let loss = loss_fn.compute(&logits, &batch.labels).map_err(wrap)?;

        correct += count_correct(&logits, &batch.labels);
        samples += batch.len();
        batch_losses.push(loss.value);
    }

    finish_report(batch_losses, correct, samples, "validation")
}

/// Forward-only pass collecting `(targets, predictions)` in iteration order,
/// ready for a confusion matrix.
pub fn collect_predictions<M, I>(model: &mut M, batches: I) -> Result<(Vec<usize>, Vec<usize>)>
where
    M: Model + ?Sized,
    I: IntoIterator<Item = bazaar_data::Result<Batch>>,
{
    let mut targets = Vec::new();
    let mut predictions = Vec::new();
    for (batch_idx, batch) in batches.into_iter().enumerate() {
        let batch = batch?;
        let logits = model
            .forward(&batch, Mode::Eval)
            .map_err(|e| TrainError::in_batch(batch_idx, e))?;
        targets.extend_from_slice(&batch.labels);
        predictions.extend(logits.argmax_classes());
    }
    Ok((targets, predictions))
}
