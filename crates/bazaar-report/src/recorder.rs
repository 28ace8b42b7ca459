// ScalarRecorder — append-only named metric streams

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ReportError, Result};

/// One recorded reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarPoint {
    pub step: u64,
    pub value: f64,
}

/// Named scalar streams, each with its own monotonically increasing step
/// counter.
///
/// The training-loss stream and the validation-loss stream never share a
/// counter: recording to one does not advance the other.
#[derive(Debug, Default)]
pub struct ScalarRecorder {
    streams: BTreeMap<String, Vec<ScalarPoint>>,
}

impl ScalarRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to stream `name`, tagged with the stream's next step.
    /// Returns the step used.
    pub fn record_scalar(&mut self, name: &str, value: f64) -> u64 {
        let stream = self.streams.entry(name.to_string()).or_default();
        let step = stream.last().map_or(0, |p| p.step + 1);
        stream.push(ScalarPoint { step, value });
        step
    }

    /// Append with an explicit step. Steps must strictly increase within a
    /// stream.
    pub fn record_scalar_at(&mut self, name: &str, value: f64, step: u64) -> Result<()> {
        let stream = self.streams.entry(name.to_string()).or_default();
        if let Some(last) = stream.last() {
            if step <= last.step {
                return Err(ReportError::NonMonotonicStep {
                    stream: name.to_string(),
                    step,
                    last: last.step,
                });
            }
        }
        stream.push(ScalarPoint { step, value });
        Ok(())
    }

    /// Points of one stream, in record order.
    pub fn series(&self, name: &str) -> Option<&[ScalarPoint]> {
        self.streams.get(name).map(Vec::as_slice)
    }

    /// Values of one stream without their steps; empty for unknown streams.
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.series(name)
            .map(|pts| pts.iter().map(|p| p.value).collect())
            .unwrap_or_default()
    }

    /// Stream names, sorted.
    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Export every stream as JSON lines, one
    /// `{"name": …, "step": …, "value": …}` object per reading.
    pub fn write_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (name, points) in &self.streams {
            for p in points {
                let line = serde_json::json!({
                    "name": name,
                    "step": p.step,
                    "value": p.value,
                });
                writeln!(out, "{line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_start_at_zero_and_advance() {
        let mut rec = ScalarRecorder::new();
        assert_eq!(rec.record_scalar("train_loss", 1.0), 0);
        assert_eq!(rec.record_scalar("train_loss", 0.8), 1);
        assert_eq!(rec.record_scalar("train_loss", 0.7), 2);
    }

    #[test]
    fn test_streams_have_independent_counters() {
        let mut rec = ScalarRecorder::new();
        rec.record_scalar("train_loss", 1.0);
        rec.record_scalar("train_loss", 0.9);
        assert_eq!(rec.record_scalar("val_loss", 1.2), 0);
        assert_eq!(rec.record_scalar("train_loss", 0.8), 2);
        assert_eq!(rec.record_scalar("val_loss", 1.1), 1);
    }

    #[test]
    fn test_explicit_steps_must_advance() {
        let mut rec = ScalarRecorder::new();
        rec.record_scalar_at("acc", 0.5, 10).unwrap();
        rec.record_scalar_at("acc", 0.6, 20).unwrap();
        let err = rec.record_scalar_at("acc", 0.7, 20).unwrap_err();
        assert!(matches!(
            err,
            ReportError::NonMonotonicStep { step: 20, last: 20, .. }
        ));
        // Auto stepping continues after the explicit steps.
        assert_eq!(rec.record_scalar("acc", 0.8), 21);
    }

    #[test]
    fn test_series_and_values() {
        let mut rec = ScalarRecorder::new();
        rec.record_scalar("loss", 2.0);
        rec.record_scalar("loss", 1.5);
        assert_eq!(rec.values("loss"), vec![2.0, 1.5]);
        assert_eq!(
            rec.series("loss").unwrap()[1],
            ScalarPoint { step: 1, value: 1.5 }
        );
        assert!(rec.series("missing").is_none());
        assert_eq!(rec.stream_names(), vec!["loss"]);
    }
}
