// plot_curves — training vs validation loss chart

use std::path::Path;

use plotters::prelude::*;

use crate::error::{render_err, ReportError, Result};

/// Render a dual-line chart of training and validation loss per epoch.
///
/// The three slices must have equal length.
pub fn plot_curves(
    path: impl AsRef<Path>,
    epochs: &[usize],
    train_losses: &[f64],
    val_losses: &[f64],
) -> Result<()> {
    if epochs.len() != train_losses.len() {
        return Err(ReportError::LengthMismatch {
            what: "epochs vs training losses",
            expected: epochs.len(),
            got: train_losses.len(),
        });
    }
    if epochs.len() != val_losses.len() {
        return Err(ReportError::LengthMismatch {
            what: "epochs vs validation losses",
            expected: epochs.len(),
            got: val_losses.len(),
        });
    }
    if epochs.is_empty() {
        return Err(ReportError::Render("nothing to plot".to_string()));
    }

    let x_lo = epochs[0] as f64;
    let x_hi = (epochs[epochs.len() - 1] as f64).max(x_lo + 1.0);
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for &v in train_losses.iter().chain(val_losses) {
        y_lo = y_lo.min(v);
        y_hi = y_hi.max(v);
    }
    let pad = ((y_hi - y_lo) * 0.05).max(1e-3);
    let (y_lo, y_hi) = (y_lo - pad, y_hi + pad);

    let root = BitMapBackend::new(path.as_ref(), (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Training vs validation loss", ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("epoch")
        .y_desc("loss")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            epochs
                .iter()
                .zip(train_losses)
                .map(|(&e, &l)| (e as f64, l)),
            &RED,
        ))
        .map_err(render_err)?
        .label("train")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], RED));
    chart
        .draw_series(LineSeries::new(
            epochs.iter().zip(val_losses).map(|(&e, &l)| (e as f64, l)),
            &BLUE,
        ))
        .map_err(render_err)?
        .label("validation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;
    root.present().map_err(render_err)?;
    Ok(())
}
