use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use coastal_lib::carbonate::CarbonateInput;
use coastal_lib::sediment::SedimentInput;
use coastal_lib::shoreline::{DEFAULT_RATE_M_PER_YEAR, DEFAULT_YEARS};
use coastal_lib::tide_data::{Query, Units};

/// Coastal and ocean engineering toolkit.
#[derive(Parser)]
#[command(
    name = "coastal-toolkit",
    version,
    about = "Analyze tides, sediment transport, and shoreline change"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file (default: ./coastal-config.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Module to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available modules.
#[derive(Subcommand)]
pub enum Command {
    /// Tidal analysis and visualization from NOAA predictions.
    Tides(TidesArgs),
    /// Bedload sediment transport calculator.
    Sediment(SedimentArgs),
    /// Carbonate chemistry: aragonite saturation state.
    Carbonate(CarbonateArgs),
    /// Shoreline erosion projection.
    Shoreline(ShorelineArgs),
}

impl Command {
    /// Human-readable module name for error messages.
    pub fn module_name(&self) -> &'static str {
        match self {
            Command::Tides(_) => "tidal analysis",
            Command::Sediment(_) => "sediment transport",
            Command::Carbonate(_) => "carbonate chemistry",
            Command::Shoreline(_) => "shoreline projection",
        }
    }
}

/// Arguments for the `tides` subcommand.
#[derive(clap::Args)]
pub struct TidesArgs {
    /// NOAA station id, overriding the config file.
    #[arg(short, long)]
    pub station: Option<String>,

    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub begin: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Vertical datum, e.g. MLLW or MSL.
    #[arg(long)]
    pub datum: Option<String>,

    /// Height units: metric or english.
    #[arg(long)]
    pub units: Option<Units>,

    /// Write the chart as a PBM image instead of drawing it in the terminal.
    #[arg(long, value_name = "FILE")]
    pub chart: Option<PathBuf>,

    /// Skip the chart and print only the summary.
    #[arg(long, conflicts_with = "chart")]
    pub no_plot: bool,
}

impl TidesArgs {
    /// Apply command-line overrides to a query built from config.
    pub fn apply(&self, mut query: Query) -> Query {
        if let Some(station) = &self.station {
            query.station_id = station.clone();
        }
        if let Some(begin) = self.begin {
            query.begin_date = begin;
        }
        if let Some(end) = self.end {
            query.end_date = end;
        }
        if let Some(datum) = &self.datum {
            query.datum = datum.clone();
        }
        if let Some(units) = self.units {
            query.units = units;
        }
        query
    }
}

/// Arguments for the `sediment` subcommand.
#[derive(clap::Args)]
pub struct SedimentArgs {
    /// Flow velocity (m/s).
    #[arg(short = 'u', long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub velocity: f64,

    /// Median grain size D50 (mm).
    #[arg(short, long, default_value_t = 0.2)]
    pub d50: f64,
}

impl From<&SedimentArgs> for SedimentInput {
    fn from(args: &SedimentArgs) -> Self {
        SedimentInput {
            velocity_m_s: args.velocity,
            d50_mm: args.d50,
        }
    }
}

/// Arguments for the `carbonate` subcommand.
#[derive(clap::Args)]
pub struct CarbonateArgs {
    /// Total alkalinity (µmol/kg).
    #[arg(long, default_value_t = 2300.0)]
    pub alkalinity: f64,

    /// Dissolved inorganic carbon (µmol/kg).
    #[arg(long, default_value_t = 2000.0)]
    pub dic: f64,

    /// Temperature (°C).
    #[arg(short, long, default_value_t = 20.0, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Salinity.
    #[arg(short, long, default_value_t = 35.0)]
    pub salinity: f64,
}

impl From<&CarbonateArgs> for CarbonateInput {
    fn from(args: &CarbonateArgs) -> Self {
        CarbonateInput {
            alkalinity_umol_kg: args.alkalinity,
            dic_umol_kg: args.dic,
            temperature_c: args.temperature,
            salinity: args.salinity,
        }
    }
}

/// Arguments for the `shoreline` subcommand.
#[derive(clap::Args)]
pub struct ShorelineArgs {
    /// Years to project (1-100).
    #[arg(short, long, default_value_t = DEFAULT_YEARS,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    pub years: u32,

    /// Erosion rate (m/year).
    #[arg(short, long, default_value_t = DEFAULT_RATE_M_PER_YEAR, allow_negative_numbers = true)]
    pub rate: f64,
}
