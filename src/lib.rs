//! # Coastal Toolkit Core Library
//!
//! This library holds the calculators behind the `coastal-toolkit` binary. Each
//! module is an independent, stateless computation: nothing is cached between
//! invocations and a failure in one module never affects another.
//!
//! ## Modules
//!
//! - [`tide_data`]: NOAA CO-OPS tide predictions. Builds the query, performs the
//!   single HTTP GET and parses the delimited-text response into a [`TideSeries`]
//! - [`summary`]: scalar statistics over a series (tidal range)
//! - [`render`] and [`chart`]: chart and metric collaborators the tide pipeline
//!   hands its results to
//! - [`sediment`]: bedload transport rate from flow velocity and grain size
//! - [`carbonate`]: carbonate-system equilibrium and aragonite saturation state
//! - [`shoreline`]: linear shoreline erosion projection
//! - [`config`]: TOML configuration shared by the binary
//!
//! ## Data Flow (tides)
//! 1. **Query**: built fresh from [`config::Config`] plus command-line overrides
//! 2. **Fetch**: one GET against the predictions endpoint
//! 3. **Parse**: skip metadata lines, read the header, coerce every row
//! 4. **Summarize**: `range = max - min`
//! 5. **Render**: plot the series and display the range, then discard everything

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod carbonate;
pub mod chart;
pub mod config;
pub mod render;
pub mod sediment;
pub mod shoreline;
pub mod summary;
pub mod tide_data;

/// A single predicted water level.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use coastal_lib::Sample;
///
/// let sample = Sample {
///     time: Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap(),
///     height: 3.2,
/// };
/// assert_eq!(sample.height, 3.2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Prediction time (the API is always queried in GMT)
    pub time: DateTime<Utc>,
    /// Predicted height above the query datum, in the query units
    pub height: f64,
}

/// Ordered tide predictions for one station and date range.
///
/// Samples keep the order the upstream service delivered them in. The labels
/// are the normalized header names of the timestamp and height columns.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use coastal_lib::{Sample, TideSeries};
///
/// let start = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
/// let series = TideSeries {
///     samples: vec![
///         Sample { time: start, height: 2.1 },
///         Sample { time: start + chrono::Duration::hours(6), height: 2.8 },
///     ],
///     time_label: "date time".to_string(),
///     height_label: "prediction".to_string(),
/// };
///
/// assert_eq!(series.len(), 2);
/// assert_eq!(series.heights().collect::<Vec<_>>(), vec![2.1, 2.8]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideSeries {
    /// Predictions in delivery order
    pub samples: Vec<Sample>,
    /// Normalized name of the timestamp column
    pub time_label: String,
    /// Normalized name of the height column
    pub height_label: String,
}

impl TideSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.height)
    }
}
