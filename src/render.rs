//! # Result Rendering
//!
//! The calculators never draw anything themselves. They hand their results to
//! two collaborators:
//! - a [`Plotter`] that turns an ordered `(x, y)` series plus labels into a chart
//! - a [`MetricDisplay`] that shows a single labelled value
//!
//! Terminal implementations of both live here ([`AsciiChart`],
//! [`ConsoleMetrics`]); the raster implementation is in [`crate::chart`].

use crate::summary::Summary;
use crate::tide_data::Units;
use crate::TideSeries;
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Chart title used for tide predictions.
pub const TIDE_CHART_TITLE: &str = "Tidal Heights Prediction from NOAA API";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("nothing to plot")]
    NoData,

    #[error("x and y lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("chart output failed: {0}")]
    Io(#[from] io::Error),
}

/// Axis, title and legend text for a line plot.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend: String,
}

impl PlotLabels {
    /// Labels for a tide height plot in `units`.
    pub fn tide(units: Units) -> Self {
        PlotLabels {
            title: TIDE_CHART_TITLE.to_string(),
            x_label: "Time".to_string(),
            y_label: format!("Tide Height ({})", units.height_unit()),
            legend: "Tide Height".to_string(),
        }
    }
}

/// Whatever a [`Plotter`] produced. Callers only pass it on or print it.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartHandle {
    /// Rendered text, ready to print
    Text(String),
    /// Image written to disk
    Image {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Charting collaborator: one line series against time.
pub trait Plotter {
    fn plot(
        &mut self,
        x: &[DateTime<Utc>],
        y: &[f64],
        labels: &PlotLabels,
    ) -> Result<ChartHandle, RenderError>;
}

/// Metric collaborator: a label and an already formatted value.
pub trait MetricDisplay {
    fn display(&mut self, label: &str, value: &str) -> io::Result<()>;
}

/// Format `value` with `decimals` places and a unit suffix.
pub fn format_metric(value: f64, decimals: usize, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value:.decimals$}")
    } else {
        format!("{value:.decimals$} {unit}")
    }
}

/// Hand a fetched series to the chart collaborator and its range to the
/// metric collaborator.
///
/// Nothing is displayed if plotting fails, so a failed render never leaves a
/// range without its chart.
pub fn render<P, M>(
    series: &TideSeries,
    summary: &Summary,
    units: Units,
    plotter: &mut P,
    metrics: &mut M,
) -> Result<ChartHandle, RenderError>
where
    P: Plotter + ?Sized,
    M: MetricDisplay + ?Sized,
{
    let x: Vec<_> = series.times().collect();
    let y: Vec<_> = series.heights().collect();
    let chart = plotter.plot(&x, &y, &PlotLabels::tide(units))?;

    metrics.display(
        "Tidal Range",
        &format_metric(summary.range, 2, units.height_unit()),
    )?;

    Ok(chart)
}

/// Line plot drawn with characters, for terminals.
#[derive(Clone, Debug)]
pub struct AsciiChart {
    rows: usize,
    max_columns: usize,
}

impl Default for AsciiChart {
    fn default() -> Self {
        Self {
            rows: 16,
            max_columns: 72,
        }
    }
}

impl AsciiChart {
    pub fn new(rows: usize, max_columns: usize) -> Self {
        Self {
            rows: rows.max(2),
            max_columns: max_columns.max(2),
        }
    }
}

impl Plotter for AsciiChart {
    fn plot(
        &mut self,
        x: &[DateTime<Utc>],
        y: &[f64],
        labels: &PlotLabels,
    ) -> Result<ChartHandle, RenderError> {
        check_lengths(x, y)?;

        const Y_AXIS_WIDTH: usize = 8;
        let rows = self.rows;
        let columns = y.len().min(self.max_columns);

        let (min, max) = y
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let span = max - min;

        let to_row = |v: f64| {
            let normalized = if span > 0.0 { (v - min) / span } else { 0.5 };
            ((1.0 - normalized) * (rows as f64 - 1.0)).round() as usize
        };

        let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; rows];
        for row in grid.iter_mut() {
            row[Y_AXIS_WIDTH - 1] = '│';
        }

        for (row, value) in [(0, max), (rows - 1, min)] {
            let label = format!("{:>width$.2}", value, width = Y_AXIS_WIDTH - 2);
            for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
                grid[row][i] = ch;
            }
        }

        // Spread samples evenly over the available columns
        for column in 0..columns {
            let index = if columns > 1 {
                column * (y.len() - 1) / (columns - 1)
            } else {
                0
            };
            grid[to_row(y[index])][column + Y_AXIS_WIDTH] = '•';
        }

        let mut out = String::new();
        out.push_str(&labels.title);
        out.push('\n');
        out.push_str(&labels.y_label);
        out.push('\n');
        for row in grid {
            out.extend(row);
            out.push('\n');
        }

        let padding = " ".repeat(Y_AXIS_WIDTH);
        out.push_str(&padding);
        out.push_str(&"─".repeat(columns));
        out.push('\n');

        let first = x[0].format("%m-%d %H:%M").to_string();
        let last = x[x.len() - 1].format("%m-%d %H:%M").to_string();
        let gap = columns.saturating_sub(first.len() + last.len()).max(1);
        out.push_str(&format!("{padding}{first}{}{last}\n", " ".repeat(gap)));
        out.push_str(&format!("{padding}{} (GMT)    • {}\n", labels.x_label, labels.legend));

        Ok(ChartHandle::Text(out))
    }
}

/// Prints `label: value` lines.
pub struct ConsoleMetrics<W: Write> {
    out: W,
}

impl ConsoleMetrics<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleMetrics<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricDisplay for ConsoleMetrics<W> {
    fn display(&mut self, label: &str, value: &str) -> io::Result<()> {
        writeln!(self.out, "{label}: {value}")
    }
}

pub(crate) fn check_lengths(x: &[DateTime<Utc>], y: &[f64]) -> Result<(), RenderError> {
    if x.len() != y.len() {
        return Err(RenderError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if y.is_empty() {
        return Err(RenderError::NoData);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sample;
    use chrono::{Duration, TimeZone};

    fn test_series() -> TideSeries {
        let start = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        TideSeries {
            samples: [1.0, 2.0, 3.0, 2.0, 1.0]
                .iter()
                .enumerate()
                .map(|(i, &height)| Sample {
                    time: start + Duration::hours(i as i64),
                    height,
                })
                .collect(),
            time_label: "date time".to_string(),
            height_label: "prediction".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingPlotter {
        calls: Vec<(usize, PlotLabels)>,
    }

    impl Plotter for RecordingPlotter {
        fn plot(
            &mut self,
            x: &[DateTime<Utc>],
            y: &[f64],
            labels: &PlotLabels,
        ) -> Result<ChartHandle, RenderError> {
            check_lengths(x, y)?;
            self.calls.push((y.len(), labels.clone()));
            Ok(ChartHandle::Text(String::new()))
        }
    }

    struct FailingPlotter;

    impl Plotter for FailingPlotter {
        fn plot(
            &mut self,
            _: &[DateTime<Utc>],
            _: &[f64],
            _: &PlotLabels,
        ) -> Result<ChartHandle, RenderError> {
            Err(RenderError::NoData)
        }
    }

    #[test]
    fn test_render_calls_both_collaborators() {
        let series = test_series();
        let summary = crate::summary::summarize(&series).unwrap();
        let mut plotter = RecordingPlotter::default();
        let mut metrics = ConsoleMetrics::new(Vec::new());

        render(&series, &summary, Units::English, &mut plotter, &mut metrics).unwrap();

        assert_eq!(plotter.calls.len(), 1);
        assert_eq!(plotter.calls[0].0, 5);
        assert_eq!(plotter.calls[0].1.y_label, "Tide Height (ft)");
        let printed = String::from_utf8(metrics.into_inner()).unwrap();
        assert_eq!(printed, "Tidal Range: 2.00 ft\n");
    }

    #[test]
    fn test_failed_plot_displays_nothing() {
        let series = test_series();
        let summary = crate::summary::summarize(&series).unwrap();
        let mut metrics = ConsoleMetrics::new(Vec::new());

        let result = render(
            &series,
            &summary,
            Units::Metric,
            &mut FailingPlotter,
            &mut metrics,
        );

        assert!(result.is_err());
        assert!(metrics.into_inner().is_empty());
    }

    #[test]
    fn test_ascii_rendering() {
        let series = test_series();
        let x: Vec<_> = series.times().collect();
        let y: Vec<_> = series.heights().collect();

        let ChartHandle::Text(text) = AsciiChart::default()
            .plot(&x, &y, &PlotLabels::tide(Units::Metric))
            .unwrap()
        else {
            panic!("expected text chart");
        };

        assert!(text.starts_with(TIDE_CHART_TITLE));
        assert!(text.contains("Tide Height (m)"));
        assert_eq!(text.matches('•').count(), 5 + 1);
        assert!(text.contains("05-01 00:00"));
        assert!(text.contains("05-01 04:00"));
        assert!(text.contains("3.00"));
        assert!(text.contains("1.00"));
    }

    #[test]
    fn test_ascii_flat_series() {
        let t = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        let result = AsciiChart::new(4, 10).plot(&[t, t], &[2.0, 2.0], &PlotLabels::tide(Units::English));
        assert!(result.is_ok());
    }

    #[test]
    fn test_ascii_rejects_bad_input() {
        let t = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
        let labels = PlotLabels::tide(Units::English);
        assert!(matches!(
            AsciiChart::default().plot(&[], &[], &labels),
            Err(RenderError::NoData)
        ));
        assert!(matches!(
            AsciiChart::default().plot(&[t], &[1.0, 2.0], &labels),
            Err(RenderError::LengthMismatch { x: 1, y: 2 })
        ));
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(1.1, 2, "ft"), "1.10 ft");
        assert_eq!(format_metric(0.012345, 4, "m³/s/m"), "0.0123 m³/s/m");
        assert_eq!(format_metric(3.456, 2, ""), "3.46");
    }
}
