//! # Time-Series Plot Module
//!
//! Renders one numeric column of a sample table as an SVG line chart.
//!
//! ## Axes
//! - x: seconds since the first plotted sample, on either time column
//! - y: the chosen column, padded so flat series stay visible
//!
//! Samples whose chosen time column is not-a-time are skipped.

use crate::record::Sample;
use plotters::prelude::*;
use std::path::Path;

/// Default chart size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1000, 400);

/// Which clock to put on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeAxis {
    #[default]
    Absolute,
    Elapsed,
}

impl TimeAxis {
    fn label(&self) -> &'static str {
        match self {
            TimeAxis::Absolute => "Time (absolute), s",
            TimeAxis::Elapsed => "Time (elapsed), s",
        }
    }
}

/// Errors that can occur while rendering.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("no column named {column} in table {table}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("no plottable samples")]
    EmptySeries,
    #[error("failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Draw(e.to_string())
}

/// Collect `(seconds, value)` points for one column.
pub fn series<S: Sample>(
    samples: &[S],
    column: &str,
    axis: TimeAxis,
) -> Result<Vec<(f64, f64)>, PlotError> {
    if !S::COLUMNS.contains(&column) {
        return Err(PlotError::UnknownColumn {
            table: S::TABLE,
            column: column.to_string(),
        });
    }

    let timed: Vec<(i64, f64)> = samples
        .iter()
        .filter_map(|s| {
            let micros = match axis {
                TimeAxis::Absolute => s.time_absolute().map(|t| t.timestamp_micros()),
                TimeAxis::Elapsed => s.time_elapsed().and_then(|d| d.num_microseconds()),
            }?;
            Some((micros, s.column(column)?))
        })
        .collect();

    let Some(origin) = timed.iter().map(|(t, _)| *t).min() else {
        return Ok(Vec::new());
    };

    Ok(timed
        .into_iter()
        .map(|(t, v)| ((t - origin) as f64 / 1e6, v))
        .collect())
}

/// Write an SVG line chart of `column` against the chosen time axis.
pub fn render_series<S: Sample>(
    samples: &[S],
    column: &str,
    axis: TimeAxis,
    path: impl AsRef<Path>,
    size: (u32, u32),
) -> Result<(), PlotError> {
    let points = series(samples, column, axis)?;
    if points.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let (min_x, max_x) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (x, _)| (lo.min(*x), hi.max(*x)));
    let (min_y, max_y) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
    let pad = ((max_y - min_y) * 0.05).max(1.0);
    let max_x = if max_x > min_x { max_x } else { min_x + 1.0 };

    let root = SVGBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .caption(format!("{} ({})", column, S::TABLE), ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(min_x..max_x, (min_y - pad)..(max_y + pad))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(axis.label())
        .y_desc(column)
        .axis_style(RGBColor(60, 60, 60))
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(LineSeries::new(points, &RED))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    tracing::info!("Saved plot of {} to {}", column, path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::time::{from_unix_millis, offset};
    use crate::record::HrSample;
    use chrono::Duration;
    use chrono_tz::Tz;

    fn table(with_start: bool) -> Vec<HrSample> {
        let start = if with_start {
            from_unix_millis(1_700_000_000_000.0, &Tz::UTC)
        } else {
            None
        };
        (0..5)
            .map(|i| HrSample {
                time_elapsed: Duration::milliseconds(1000 + i * 500),
                heart_rate_bpm: 60 + i as i16,
                confidence: 90,
                ppg_raw: 100 * i as i32,
                ppg_filter: 0,
                time_absolute: offset(start, Duration::milliseconds(1000 + i * 500)),
            })
            .collect()
    }

    #[test]
    fn test_series_relative_to_first_sample() {
        let points = series(&table(true), "ppg_raw", TimeAxis::Elapsed).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], (0.0, 0.0));
        assert_eq!(points[4], (2.0, 400.0));
    }

    #[test]
    fn test_series_skips_not_a_time() {
        let points = series(&table(false), "ppg_raw", TimeAxis::Absolute).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            series(&table(true), "magnitude", TimeAxis::Elapsed),
            Err(PlotError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_render_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ppg.svg");

        render_series(&table(true), "ppg_raw", TimeAxis::Absolute, &path, DEFAULT_SIZE).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_render_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_series(
            &table(false),
            "ppg_raw",
            TimeAxis::Absolute,
            dir.path().join("empty.svg"),
            DEFAULT_SIZE,
        );
        assert!(matches!(result, Err(PlotError::EmptySeries)));
    }
}
