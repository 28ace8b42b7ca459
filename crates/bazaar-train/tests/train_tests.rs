use std::cell::Cell;

use bazaar_data::{Batch, DataError};
use bazaar_train::{
    collect_predictions, train_epoch, validate_epoch, Logits, LossFn, LossOutput, Mode, Model,
    Optimizer, TrainError,
};

/// One weight per class: `logits[i][c] = w[c] * x_i`. Gradients are exact,
/// so loop behavior is fully observable.
struct TinyLinear {
    w: Vec<f32>,
    grad: Vec<f32>,
    cached_inputs: Vec<f32>,
    modes_seen: Vec<Mode>,
    fail_on_forward: Option<usize>,
    forwards: usize,
}

impl TinyLinear {
    fn new(w: Vec<f32>) -> Self {
        let n = w.len();
        TinyLinear {
            w,
            grad: vec![0.0; n],
            cached_inputs: Vec::new(),
            modes_seen: Vec::new(),
            fail_on_forward: None,
            forwards: 0,
        }
    }
}

impl Model for TinyLinear {
    fn forward(&mut self, batch: &Batch, mode: Mode) -> bazaar_train::Result<Logits> {
        if self.fail_on_forward == Some(self.forwards) {
            return Err(TrainError::msg("injected forward failure"));
        }
        self.forwards += 1;
        self.modes_seen.push(mode);
        let xs: Vec<f32> = (0..batch.len()).map(|i| batch.sample_pixels(i)[0]).collect();
        if mode.is_train() {
            self.cached_inputs = xs.clone();
        }
        let classes = self.w.len();
        let mut values = Vec::with_capacity(batch.len() * classes);
        for &x in &xs {
            for &w in &self.w {
                values.push(w * x);
            }
        }
        Ok(Logits::new(values, batch.len(), classes))
    }

    fn backward(&mut self, grad: &Logits) -> bazaar_train::Result<()> {
        if self.cached_inputs.len() != grad.batch() {
            return Err(TrainError::msg("backward without a cached training forward"));
        }
        for (i, &x) in self.cached_inputs.iter().enumerate() {
            for c in 0..self.w.len() {
                self.grad[c] += grad.row(i)[c] * x;
            }
        }
        Ok(())
    }
}

struct Sgd {
    lr: f32,
}

impl Optimizer<TinyLinear> for Sgd {
    fn zero_grad(&mut self, model: &mut TinyLinear) {
        model.grad.iter_mut().for_each(|g| *g = 0.0);
    }

    fn step(&mut self, model: &mut TinyLinear) -> bazaar_train::Result<()> {
        for (w, g) in model.w.iter_mut().zip(&model.grad) {
            *w -= self.lr * g;
        }
        Ok(())
    }
}

/// Quadratic loss against one-hot targets, averaged over the batch.
struct SquaredLoss;

impl LossFn for SquaredLoss {
    fn compute(&self, logits: &Logits, targets: &[usize]) -> bazaar_train::Result<LossOutput> {
        if targets.len() != logits.batch() {
            return Err(TrainError::msg("target count does not match logits"));
        }
        let (batch, classes) = (logits.batch(), logits.classes());
        let mut value = 0.0f64;
        let mut grad = vec![0.0f32; batch * classes];
        for i in 0..batch {
            for c in 0..classes {
                let target = if targets[i] == c { 1.0f32 } else { 0.0 };
                let diff = logits.row(i)[c] - target;
                value += f64::from(diff * diff);
                grad[i * classes + c] = 2.0 * diff / batch as f32;
            }
        }
        Ok(LossOutput {
            value: value / batch as f64,
            grad: Logits::new(grad, batch, classes),
        })
    }
}

/// Fails on the n-th call, delegating to [`SquaredLoss`] otherwise.
struct FlakyLoss {
    fail_at: usize,
    calls: Cell<usize>,
}

impl LossFn for FlakyLoss {
    fn compute(&self, logits: &Logits, targets: &[usize]) -> bazaar_train::Result<LossOutput> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call == self.fail_at {
            return Err(TrainError::msg("injected loss failure"));
        }
        SquaredLoss.compute(logits, targets)
    }
}

fn batch_of(xs: &[f32], labels: &[usize]) -> bazaar_data::Result<Batch> {
    Ok(Batch {
        pixels: xs.to_vec(),
        sample_shape: [1, 1, 1],
        labels: labels.to_vec(),
    })
}

#[test]
fn test_train_epoch_accounting() {
    let mut model = TinyLinear::new(vec![1.0, -1.0]);
    let mut sgd = Sgd { lr: 0.01 };
    let batches = vec![
        batch_of(&[1.0, -1.0], &[0, 1]),
        batch_of(&[2.0], &[0]),
    ];
    let report = train_epoch(&mut model, batches, &mut sgd, &SquaredLoss).unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(report.samples, 3);
    assert_eq!(report.batch_losses.len(), 2);
    let expected_avg = (report.batch_losses[0] + report.batch_losses[1]) / 2.0;
    assert!((report.avg_loss - expected_avg).abs() < 1e-12);
    // w = [1, -1] separates both batches perfectly.
    assert_eq!(report.accuracy, 100.0);
}

#[test]
fn test_train_mutates_weights() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    let before = model.w.clone();
    train_epoch(
        &mut model,
        vec![batch_of(&[1.0, -1.0], &[0, 1])],
        &mut sgd,
        &SquaredLoss,
    )
    .unwrap();
    assert_ne!(model.w, before);
}

#[test]
fn test_validate_leaves_weights_untouched() {
    let mut model = TinyLinear::new(vec![0.4, -0.2]);
    let before = model.w.clone();
    let report = validate_epoch(
        &mut model,
        vec![batch_of(&[1.0, -1.0, 2.0], &[0, 1, 0])],
        &SquaredLoss,
    )
    .unwrap();
    assert_eq!(model.w, before);
    assert_eq!(model.grad, vec![0.0, 0.0]);
    assert_eq!(report.samples, 3);
    assert!(model.modes_seen.iter().all(|m| *m == Mode::Eval));
}

#[test]
fn test_train_runs_in_train_mode() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    train_epoch(
        &mut model,
        vec![batch_of(&[1.0], &[0]), batch_of(&[2.0], &[1])],
        &mut sgd,
        &SquaredLoss,
    )
    .unwrap();
    assert!(model.modes_seen.iter().all(|m| m.is_train()));
}

#[test]
fn test_loss_decreases_across_epochs() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    let mut losses = Vec::new();
    for _ in 0..30 {
        let report = train_epoch(
            &mut model,
            vec![batch_of(&[1.0, -1.0, 1.0, -1.0], &[0, 1, 0, 1])],
            &mut sgd,
            &SquaredLoss,
        )
        .unwrap();
        losses.push(report.avg_loss);
    }
    assert!(losses.last().unwrap() < losses.first().unwrap());

    let final_report = validate_epoch(
        &mut model,
        vec![batch_of(&[1.0, -1.0], &[0, 1])],
        &SquaredLoss,
    )
    .unwrap();
    assert_eq!(final_report.accuracy, 100.0);
}

#[test]
fn test_model_failure_aborts_with_batch_index() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    model.fail_on_forward = Some(1);
    let mut sgd = Sgd { lr: 0.1 };
    let batches = vec![
        batch_of(&[1.0], &[0]),
        batch_of(&[2.0], &[1]),
        batch_of(&[3.0], &[0]),
    ];
    let err = train_epoch(&mut model, batches, &mut sgd, &SquaredLoss).unwrap_err();
    assert!(matches!(err, TrainError::BatchCompute { batch: 1, .. }));
    assert!(err.to_string().contains("batch 1"));
}

#[test]
fn test_loss_failure_aborts() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    let loss = FlakyLoss {
        fail_at: 0,
        calls: Cell::new(0),
    };
    let err = train_epoch(
        &mut model,
        vec![batch_of(&[1.0], &[0])],
        &mut sgd,
        &loss,
    )
    .unwrap_err();
    assert!(matches!(err, TrainError::BatchCompute { batch: 0, .. }));
    // The failed batch never reached the optimizer.
    assert_eq!(model.w, vec![0.0, 0.0]);
}

#[test]
fn test_loader_error_propagates() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    let batches = vec![
        batch_of(&[1.0], &[0]),
        Err(DataError::ImageLoad {
            index: 9,
            path: "p09_resized.jpg".into(),
            detail: "truncated file".to_string(),
        }),
    ];
    let err = train_epoch(&mut model, batches, &mut sgd, &SquaredLoss).unwrap_err();
    assert!(matches!(err, TrainError::Data(DataError::ImageLoad { index: 9, .. })));
}

#[test]
fn test_empty_stream_is_an_error() {
    let mut model = TinyLinear::new(vec![0.0, 0.0]);
    let mut sgd = Sgd { lr: 0.1 };
    let err = train_epoch(&mut model, Vec::new(), &mut sgd, &SquaredLoss).unwrap_err();
    assert!(err.to_string().contains("no batches"));
    let err = validate_epoch(&mut model, Vec::new(), &SquaredLoss).unwrap_err();
    assert!(err.to_string().contains("no batches"));
}

#[test]
fn test_collect_predictions() {
    let mut model = TinyLinear::new(vec![1.0, -1.0]);
    let (targets, predictions) = collect_predictions(
        &mut model,
        vec![batch_of(&[1.0, -1.0], &[0, 0]), batch_of(&[2.0], &[1])],
    )
    .unwrap();
    assert_eq!(targets, vec![0, 0, 1]);
    // Positive inputs score class 0, negative inputs class 1.
    assert_eq!(predictions, vec![0, 1, 0]);
    assert!(model.modes_seen.iter().all(|m| *m == Mode::Eval));
}

#[test]
fn test_validation_is_deterministic() {
    let mut model = TinyLinear::new(vec![0.3, 0.7]);
    let batches = || vec![batch_of(&[1.0, 2.0, -1.0], &[1, 1, 0])];
    let a = validate_epoch(&mut model, batches(), &SquaredLoss).unwrap();
    let b = validate_epoch(&mut model, batches(), &SquaredLoss).unwrap();
    assert_eq!(a.avg_loss.to_bits(), b.avg_loss.to_bits());
    assert_eq!(a.accuracy, b.accuracy);
    assert_eq!(a.batch_losses, b.batch_losses);
}
