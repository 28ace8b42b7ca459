//! # bazaar-report
//!
//! Training diagnostics for the product classifier:
//!
//! - [`ScalarRecorder`]: append-only named metric streams with per-stream
//!   step counters, exportable as JSON lines.
//! - [`plot_curves`]: dual-line train/validation loss chart.
//! - [`ConfusionMatrix`]: labeled (true, predicted) counts with per-class
//!   tallies, a text table, and a heatmap render.

pub mod confusion;
pub mod curves;
pub mod error;
pub mod recorder;

pub use confusion::ConfusionMatrix;
pub use curves::plot_curves;
pub use error::{ReportError, Result};
pub use recorder::{ScalarPoint, ScalarRecorder};
