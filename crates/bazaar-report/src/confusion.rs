// ConfusionMatrix — class-by-class prediction counts

use std::path::Path;

use plotters::prelude::*;

use crate::error::{render_err, ReportError, Result};

/// Counts of (true class, predicted class) pairs over the full class set,
/// zero-count cells included. Rows are true classes, columns predictions.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<u64>>,
    class_names: Vec<String>,
}

impl ConfusionMatrix {
    /// Count pairs from parallel target/prediction slices.
    ///
    /// The slices must have equal length and every id must index into
    /// `class_names`.
    pub fn from_labels(
        targets: &[usize],
        predictions: &[usize],
        class_names: &[String],
    ) -> Result<Self> {
        if targets.len() != predictions.len() {
            return Err(ReportError::LengthMismatch {
                what: "targets vs predictions",
                expected: targets.len(),
                got: predictions.len(),
            });
        }
        let n = class_names.len();
        let check = |id: usize| {
            if id >= n {
                Err(ReportError::ClassOutOfRange {
                    id,
                    num_classes: n,
                })
            } else {
                Ok(id)
            }
        };
        let mut matrix = vec![vec![0u64; n]; n];
        for (&t, &p) in targets.iter().zip(predictions) {
            matrix[check(t)?][check(p)?] += 1;
        }
        Ok(ConfusionMatrix {
            matrix,
            class_names: class_names.to_vec(),
        })
    }

    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Count for (true, predicted).
    pub fn count(&self, target: usize, predicted: usize) -> u64 {
        self.matrix[target][predicted]
    }

    /// Row-major counts, one row per true class.
    pub fn rows(&self) -> &[Vec<u64>] {
        &self.matrix
    }

    pub fn total(&self) -> u64 {
        self.matrix.iter().flatten().sum()
    }

    pub fn true_positives(&self, class: usize) -> u64 {
        self.matrix[class][class]
    }

    pub fn false_positives(&self, class: usize) -> u64 {
        (0..self.n_classes())
            .filter(|&t| t != class)
            .map(|t| self.matrix[t][class])
            .sum()
    }

    pub fn false_negatives(&self, class: usize) -> u64 {
        (0..self.n_classes())
            .filter(|&p| p != class)
            .map(|p| self.matrix[class][p])
            .sum()
    }

    pub fn true_negatives(&self, class: usize) -> u64 {
        self.total()
            - self.true_positives(class)
            - self.false_positives(class)
            - self.false_negatives(class)
    }

    /// Samples whose true class is `class`.
    pub fn support(&self, class: usize) -> u64 {
        self.matrix[class].iter().sum()
    }

    /// Diagonal share of all counts.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let diag: u64 = (0..self.n_classes()).map(|c| self.matrix[c][c]).sum();
        diag as f64 / total as f64
    }

    /// Text table with class-name headers, rows true and columns predicted.
    pub fn to_string_table(&self) -> String {
        let width = self
            .class_names
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(5)
            + 2;
        let mut out = String::new();
        out.push_str(&" ".repeat(width));
        for name in &self.class_names {
            out.push_str(&format!("{name:>width$}"));
        }
        out.push('\n');
        for (t, row) in self.matrix.iter().enumerate() {
            out.push_str(&format!("{:>width$}", self.class_names[t]));
            for count in row {
                out.push_str(&format!("{count:>width$}"));
            }
            out.push('\n');
        }
        out
    }

    /// Render the matrix as a heatmap PNG, cells shaded by count and
    /// annotated with the count value.
    pub fn render_heatmap(&self, path: impl AsRef<Path>) -> Result<()> {
        let n = self.n_classes();
        if n == 0 {
            return Err(ReportError::Render("empty class set".to_string()));
        }
        let side = (96 * n as u32 + 200).min(1400);
        let root = BitMapBackend::new(path.as_ref(), (side, side)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let max = self
            .matrix
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption("Confusion matrix", ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(56)
            .y_label_area_size(96)
            .build_cartesian_2d(0..n as i32, 0..n as i32)
            .map_err(render_err)?;

        let x_names = self.class_names.clone();
        let y_names = self.class_names.clone();
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("predicted")
            .y_desc("true")
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&move |v| {
                x_names.get(*v as usize).cloned().unwrap_or_default()
            })
            .y_label_formatter(&move |v| {
                y_names.get(*v as usize).cloned().unwrap_or_default()
            })
            .draw()
            .map_err(render_err)?;

        let cells = (0..n).flat_map(|t| (0..n).map(move |p| (t, p)));
        chart
            .draw_series(cells.clone().map(|(t, p)| {
                let share = self.matrix[t][p] as f64 / max;
                let color = RGBColor(
                    (255.0 - 205.0 * share) as u8,
                    (255.0 - 155.0 * share) as u8,
                    255,
                );
                Rectangle::new(
                    [(p as i32, t as i32), (p as i32 + 1, t as i32 + 1)],
                    color.filled(),
                )
            }))
            .map_err(render_err)?;
        chart
            .draw_series(cells.map(|(t, p)| {
                Text::new(
                    self.matrix[t][p].to_string(),
                    (p as i32, t as i32),
                    ("sans-serif", 16).into_font().color(&BLACK),
                )
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }
}
