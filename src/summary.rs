//! Scalar statistics over a tide series.

use crate::tide_data::TideError;
use crate::TideSeries;
use serde::Serialize;

/// Extremes and tidal range of one series. Recomputed for every fetch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// Highest predicted height minus lowest predicted height
    pub range: f64,
    pub min: f64,
    pub max: f64,
}

/// Tidal range (`max - min`) over every sample in `series`.
///
/// # Errors
/// [`TideError::EmptySeries`] when the series has no samples.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use coastal_lib::{summary::summarize, Sample, TideSeries};
///
/// let t = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
/// let series = TideSeries {
///     samples: [1.0, 3.5, 2.2]
///         .iter()
///         .map(|&height| Sample { time: t, height })
///         .collect(),
///     time_label: "date time".into(),
///     height_label: "prediction".into(),
/// };
/// assert!((summarize(&series).unwrap().range - 2.5).abs() < 1e-9);
/// ```
pub fn summarize(series: &TideSeries) -> Result<Summary, TideError> {
    if series.is_empty() {
        return Err(TideError::EmptySeries);
    }

    let (min, max) = series
        .heights()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), h| {
            (min.min(h), max.max(h))
        });

    Ok(Summary {
        range: max - min,
        min,
        max,
    })
}
