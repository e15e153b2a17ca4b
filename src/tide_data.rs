//! # NOAA Tide Data Fetching and Parsing
//!
//! This module handles the network side of tidal analysis: building a request
//! for the NOAA CO-OPS data API, performing the single HTTP GET, and turning
//! the delimited-text response into a [`TideSeries`].
//!
//! ## Data Source
//!
//! ### NOAA CO-OPS data API
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Product**: `predictions` (harmonic tide predictions)
//! - **Time zone**: always GMT, so timestamps are parsed as UTC
//! - **Format**: comma-delimited text
//!
//! ### Response Layout
//! ```text
//! <metadata line>
//! <metadata line>
//! Date Time, Prediction
//! 2023-05-01 00:00, 2.100
//! 2023-05-01 06:00, 2.800
//! ```
//! The first two lines are discarded. The header row fixes the column roles:
//! first column = timestamp, second column = height. Any further columns are
//! carried through the parser untouched and ignored.
//!
//! ## Error Handling
//!
//! - **Network**: transport failures and non-success HTTP statuses. The body
//!   of a failed response is never parsed.
//! - **Parse**: empty body, fewer than two columns, or any row whose
//!   timestamp or height does not coerce.
//! - **EmptySeries**: raised by [`crate::summary::summarize`].
//!
//! Nothing is retried and no partial series is ever returned.

use crate::config::{ApiConfig, Config};
use crate::{Sample, TideSeries};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Number of non-tabular lines that precede the header row.
pub const METADATA_LINES: usize = 2;

/// Timestamp layouts accepted in the first column, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Errors that can occur while fetching or processing tide data.
#[derive(Error, Debug)]
pub enum TideError {
    /// Request could not be completed or the server refused it
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Response body did not contain a usable prediction table
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Summary requested over a series with no samples
    #[error("cannot summarize an empty tide series")]
    EmptySeries,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(StatusCode),
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("response body is empty after skipping the metadata lines")]
    EmptyBody,

    #[error("expected at least 2 columns in header, found {found}")]
    MissingColumns { found: usize },

    #[error("header present but no data rows")]
    NoRows,

    #[error("line {line}: expected at least 2 fields")]
    MissingField { line: u64 },

    #[error("line {line}: cannot parse timestamp {value:?}")]
    BadTimestamp { line: u64, value: String },

    #[error("line {line}: height {value:?} is not a number")]
    BadHeight { line: u64, value: String },

    #[error("malformed delimited text: {0}")]
    Malformed(String),
}

/// Measurement system for returned heights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    #[default]
    English,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::English => "english",
        }
    }

    /// Short unit suffix for heights in this system.
    pub fn height_unit(self) -> &'static str {
        match self {
            Units::Metric => "m",
            Units::English => "ft",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "m" => Ok(Units::Metric),
            "english" | "ft" => Ok(Units::English),
            other => Err(format!("unknown units {other:?} (expected metric or english)")),
        }
    }
}

/// One tide prediction request. Built fresh for every invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub station_id: String,
    pub begin_date: NaiveDate,
    pub end_date: NaiveDate,
    pub datum: String,
    pub units: Units,
}

impl Query {
    pub const PRODUCT: &'static str = "predictions";
    pub const TIME_ZONE: &'static str = "gmt";
    pub const FORMAT: &'static str = "csv";

    /// Query for the configured station and date range.
    pub fn from_config(config: &Config) -> Self {
        Query {
            station_id: config.station.id.clone(),
            begin_date: config.tides.begin_date,
            end_date: config.tides.end_date,
            datum: config.tides.datum.clone(),
            units: config.tides.units,
        }
    }

    /// Query parameters in request order. Dates use the API's `YYYYMMDD` form.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("begin_date", self.begin_date.format("%Y%m%d").to_string()),
            ("end_date", self.end_date.format("%Y%m%d").to_string()),
            ("station", self.station_id.clone()),
            ("product", Self::PRODUCT.to_string()),
            ("datum", self.datum.clone()),
            ("units", self.units.as_str().to_string()),
            ("time_zone", Self::TIME_ZONE.to_string()),
            ("format", Self::FORMAT.to_string()),
        ]
    }
}

/// Where and as whom requests are sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub base_url: String,
    pub application: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Endpoint {
    /// Endpoint for `api`, with the token read from its environment variable.
    pub fn from_config(api: &ApiConfig) -> Self {
        Endpoint {
            base_url: api.base_url.clone(),
            application: api.application.clone(),
            token: api.token(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }

    /// Full request URL for `query`, parameters URL-encoded.
    pub fn url_for(&self, query: &Query) -> Result<Url, TideError> {
        let mut params = query.params();
        params.push(("application", self.application.clone()));
        if let Some(token) = &self.token {
            params.push(("api_key", token.clone()));
        }
        Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {e}", self.base_url)).into())
    }

    /// HTTP client honouring the configured timeout.
    pub fn client(&self) -> Result<Client, TideError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| NetworkError::Client(e).into())
    }
}

/// Fetch predicted tide heights for `query`.
///
/// Performs exactly one GET. A non-success status is reported as
/// [`NetworkError::Status`] without reading the body.
///
/// # Example
/// ```no_run
/// use coastal_lib::config::Config;
/// use coastal_lib::tide_data::{fetch_tide_series, Endpoint, Query};
///
/// # async fn run() -> Result<(), coastal_lib::tide_data::TideError> {
/// let config = Config::default();
/// let endpoint = Endpoint::from_config(&config.api);
/// let client = endpoint.client()?;
/// let series = fetch_tide_series(&client, &endpoint, &Query::from_config(&config)).await?;
/// println!("{} predictions", series.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch_tide_series(
    client: &Client,
    endpoint: &Endpoint,
    query: &Query,
) -> Result<TideSeries, TideError> {
    let url = endpoint.url_for(query)?;
    tracing::info!(
        station = %query.station_id,
        begin = %query.begin_date,
        end = %query.end_date,
        "requesting tide predictions"
    );

    let response = client
        .get(url)
        .send()
        .await
        .map_err(NetworkError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%status, "tide prediction request rejected");
        return Err(NetworkError::Status(status).into());
    }

    let body = response.text().await.map_err(NetworkError::Transport)?;
    tracing::debug!(bytes = body.len(), "received prediction table");

    parse_predictions(&body)
}

/// Parse a delimited-text prediction table.
///
/// Skips [`METADATA_LINES`] lines, reads the header row, and coerces every
/// data row. Row order is preserved; no sort is applied.
pub fn parse_predictions(body: &str) -> Result<TideSeries, TideError> {
    let table = skip_lines(body, METADATA_LINES);
    if table.trim().is_empty() {
        return Err(ParseError::EmptyBody.into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(table.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ParseError::Malformed(e.to_string()))?
        .clone();
    if headers.len() < 2 {
        return Err(ParseError::MissingColumns {
            found: headers.len(),
        }
        .into());
    }
    let time_label = normalize_header(&headers[0]);
    let height_label = normalize_header(&headers[1]);

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ParseError::Malformed(e.to_string()))?;
        // Whitespace-only lines come through as a single empty field
        if record.iter().all(|f| clean_field(f).is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() + METADATA_LINES as u64)
            .unwrap_or_default();

        let (Some(raw_time), Some(raw_height)) = (record.get(0), record.get(1)) else {
            return Err(ParseError::MissingField { line }.into());
        };

        let raw_time = clean_field(raw_time);
        let time = parse_timestamp(raw_time).ok_or_else(|| ParseError::BadTimestamp {
            line,
            value: raw_time.to_string(),
        })?;

        let raw_height = clean_field(raw_height);
        let height = raw_height
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite())
            .ok_or_else(|| ParseError::BadHeight {
                line,
                value: raw_height.to_string(),
            })?;

        samples.push(Sample { time, height });
    }

    if samples.is_empty() {
        return Err(ParseError::NoRows.into());
    }

    if let Some(i) = first_out_of_order(&samples) {
        tracing::warn!(
            previous = %samples[i - 1].time,
            next = %samples[i].time,
            "predictions are not in chronological order; keeping delivery order"
        );
    }

    tracing::debug!(rows = samples.len(), %time_label, %height_label, "parsed predictions");

    Ok(TideSeries {
        samples,
        time_label,
        height_label,
    })
}

/// Index of the first sample whose time is earlier than its predecessor's.
pub fn first_out_of_order(samples: &[Sample]) -> Option<usize> {
    samples
        .windows(2)
        .position(|w| w[1].time < w[0].time)
        .map(|i| i + 1)
}

/// Canonical header form: trimmed, unquoted, single-spaced, lowercase.
pub fn normalize_header(name: &str) -> String {
    clean_field(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a GMT timestamp in any of the layouts the API emits.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

// -- Private Implementation --

/// Strip whitespace and one pair of surrounding double quotes.
///
/// The reader only honours quotes at the very start of a field, so a quoted
/// value after `", "` arrives with its quotes intact.
fn clean_field(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(field)
}

fn skip_lines(body: &str, count: usize) -> &str {
    let mut rest = body;
    for _ in 0..count {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}
