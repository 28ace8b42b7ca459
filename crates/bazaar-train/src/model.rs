// Model, LossFn, Optimizer — seams between the loops and the framework
//
// The loops never touch parameters directly: the model computes, the loss
// scores and differentiates, and the optimizer is the only component that
// writes parameter updates (it receives the model mutably in `step`).

use bazaar_data::Batch;

use crate::error::Result;

/// Whether a forward pass is part of training or evaluation.
///
/// Passed explicitly into every forward call; there is no hidden mode flag
/// to set and restore. Layers that behave differently at train time
/// (dropout, batch statistics) key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// Class scores for a batch, row-major `[batch, classes]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Logits {
    values: Vec<f32>,
    batch: usize,
    classes: usize,
}

impl Logits {
    pub fn new(values: Vec<f32>, batch: usize, classes: usize) -> Self {
        debug_assert_eq!(values.len(), batch * classes);
        Logits {
            values,
            batch,
            classes,
        }
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Scores for sample `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.values[i * self.classes..(i + 1) * self.classes]
    }

    /// Highest-scoring class per sample.
    pub fn argmax_classes(&self) -> Vec<usize> {
        (0..self.batch)
            .map(|i| {
                let row = self.row(i);
                let mut best = 0;
                for (c, v) in row.iter().enumerate() {
                    if *v > row[best] {
                        best = c;
                    }
                }
                best
            })
            .collect()
    }
}

/// The classifier under training.
pub trait Model {
    /// Score a batch. `Mode::Train` passes must cache whatever `backward`
    /// needs; `Mode::Eval` passes must not affect parameters or caches used
    /// for updates.
    fn forward(&mut self, batch: &Batch, mode: Mode) -> Result<Logits>;

    /// Accumulate parameter gradients from the loss gradient of the most
    /// recent training forward.
    fn backward(&mut self, grad: &Logits) -> Result<()>;
}

/// Scores logits against target class ids.
pub trait LossFn {
    fn compute(&self, logits: &Logits, targets: &[usize]) -> Result<LossOutput>;
}

/// A scalar loss plus its gradient with respect to the logits.
#[derive(Debug, Clone)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Logits,
}

/// Applies parameter updates from the gradients accumulated in the model.
///
/// The only component allowed to mutate weights.
pub trait Optimizer<M: Model + ?Sized> {
    /// Clear accumulated gradients before a new backward pass.
    fn zero_grad(&mut self, model: &mut M);

    /// Apply one update step.
    fn step(&mut self, model: &mut M) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_classes() {
        let logits = Logits::new(vec![0.1, 0.9, 2.0, -1.0, 0.5, 0.5], 3, 2);
        assert_eq!(logits.argmax_classes(), vec![1, 0, 0]);
    }

    #[test]
    fn test_row_indexing() {
        let logits = Logits::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        assert_eq!(logits.row(0), &[1.0, 2.0]);
        assert_eq!(logits.row(1), &[3.0, 4.0]);
    }
}
