// Evaluation metrics

/// Fraction of predictions matching their targets, in `[0, 1]`.
///
/// Empty or mismatched inputs score 0.
pub fn accuracy(predictions: &[usize], targets: &[usize]) -> f64 {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(targets)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / predictions.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 2], &[0, 1, 0, 2]), 0.75);
        assert_eq!(accuracy(&[1, 1], &[0, 0]), 0.0);
        assert_eq!(accuracy(&[2], &[2]), 1.0);
    }

    #[test]
    fn test_accuracy_degenerate_inputs() {
        assert_eq!(accuracy(&[], &[]), 0.0);
        assert_eq!(accuracy(&[0, 1], &[0]), 0.0);
    }
}
