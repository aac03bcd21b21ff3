//! Runtime chart of benchmark records, rendered as SVG.

use crate::bench::BenchRecord;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

pub const TITLE: &str = "DH-based PSI runtime vs set size";
pub const X_DESC: &str = "Set size |S_A| = |S_B|";
pub const Y_DESC: &str = "Average runtime (seconds)";

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no benchmark records to plot")]
    NoRecords,

    #[error("failed to render chart: {0}")]
    Render(String),
}

fn render_err<E: Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

/// Draw average runtime against set size, one marker per record, to an SVG
/// file at `path`. Records are plotted in the order given.
pub fn plot_runtime(records: &[BenchRecord], path: &Path) -> Result<(), PlotError> {
    if records.is_empty() {
        return Err(PlotError::NoRecords);
    }
    let points: Vec<(f64, f64)> = records
        .iter()
        .map(|r| (r.set_size as f64, r.avg_runtime_seconds))
        .collect();
    let x_max = points.iter().map(|p| p.0).fold(1.0, f64::max) * 1.05;
    let y_max = points.iter().map(|p| p.1).fold(f64::EPSILON, f64::max) * 1.1;

    let root = SVGBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(X_DESC)
        .y_desc(Y_DESC)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(render_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}
