//! # Coastal Toolkit Entry Point
//!
//! Selects one module from the command line, runs it, and reports either its
//! full result or a single error message. Modules share nothing: each
//! invocation builds its inputs fresh and discards everything on exit.


mod cli;
mod logging;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

use cli::{CarbonateArgs, Cli, Command, SedimentArgs, ShorelineArgs, TidesArgs};
use coastal_lib::{
    carbonate,
    chart::BitmapChart,
    config::Config,
    render::{format_metric, render, AsciiChart, ChartHandle, ConsoleMetrics, MetricDisplay},
    sediment,
    shoreline,
    summary::{summarize, Summary},
    tide_data::{fetch_tide_series, Endpoint, Query},
    TideSeries,
};

/// Number of rows shown in the data preview above the chart.
const PREVIEW_ROWS: usize = 5;

#[derive(Serialize)]
struct TideReport<'a> {
    station: &'a str,
    units: &'a str,
    datum: &'a str,
    summary: &'a Summary,
    series: &'a TideSeries,
}

/// Main application entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match &cli.config {
        // An explicitly requested file must load
        Some(path) => match Config::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::load(),
    };

    let result = match &cli.command {
        Command::Tides(args) => run_tides(args, &config, cli.json),
        Command::Sediment(args) => run_sediment(args, cli.json),
        Command::Carbonate(args) => run_carbonate(args, cli.json),
        Command::Shoreline(args) => run_shoreline(args, cli.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(cli.command.module_name(), &e));
            ExitCode::FAILURE
        }
    }
}

/// The single stderr line reported for a failed module run, causes included.
fn failure_message(module: &str, err: &anyhow::Error) -> String {
    format!("Error in {module}: {err:#}")
}

/// Fetch, summarize and render tide predictions.
///
/// Every fallible step runs before anything is written to stdout, so a failure
/// never leaves a partial report behind.
fn run_tides(args: &TidesArgs, config: &Config, json: bool) -> anyhow::Result<()> {
    let query = args.apply(Query::from_config(config));
    let endpoint = Endpoint::from_config(&config.api);
    if endpoint.token.is_none() {
        tracing::info!(
            env = %config.api.token_env,
            "no API token in environment, sending request without api_key"
        );
    }

    let client = endpoint.client()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let series = runtime
        .block_on(fetch_tide_series(&client, &endpoint, &query))
        .context("error fetching or processing tidal data")?;
    let summary = summarize(&series).context("error summarizing tidal data")?;

    let stdout = io::stdout();
    if json {
        let report = TideReport {
            station: &query.station_id,
            units: query.units.as_str(),
            datum: &query.datum,
            summary: &summary,
            series: &series,
        };
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    // Metrics are buffered so they print after the chart
    let mut metrics = ConsoleMetrics::new(Vec::new());
    let chart = if args.no_plot {
        metrics.display(
            "Tidal Range",
            &format_metric(summary.range, 2, query.units.height_unit()),
        )?;
        None
    } else if let Some(path) = &args.chart {
        let mut plotter = BitmapChart::new(path, &config.chart);
        Some(render(&series, &summary, query.units, &mut plotter, &mut metrics)?)
    } else {
        let mut plotter = AsciiChart::default();
        Some(render(&series, &summary, query.units, &mut plotter, &mut metrics)?)
    };

    let mut out = stdout.lock();
    writeln!(
        out,
        "Tidal predictions for station {} ({} to {}, datum {}):",
        query.station_id, query.begin_date, query.end_date, query.datum
    )?;
    writeln!(out, "{:<20} {}", series.time_label, series.height_label)?;
    for sample in series.samples.iter().take(PREVIEW_ROWS) {
        writeln!(out, "{:<20} {:.3}", sample.time.format("%Y-%m-%d %H:%M"), sample.height)?;
    }
    if series.len() > PREVIEW_ROWS {
        writeln!(out, "... {} rows", series.len())?;
    }
    writeln!(out)?;

    match chart {
        Some(ChartHandle::Text(text)) => writeln!(out, "{text}")?,
        Some(ChartHandle::Image {
            path,
            width,
            height,
        }) => writeln!(out, "Chart written to {} ({width}x{height})", path.display())?,
        None => {}
    }
    out.write_all(&metrics.into_inner())?;
    Ok(())
}

fn run_sediment(args: &SedimentArgs, json: bool) -> anyhow::Result<()> {
    let result = sediment::bedload_transport(&args.into())
        .context("error in sediment transport calculation")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut metrics = ConsoleMetrics::stdout();
    metrics.display(
        "Bed Shear Stress",
        &format_metric(result.shear_stress, 3, "Pa"),
    )?;
    metrics.display(
        "Sediment Transport Rate",
        &format_metric(result.transport_rate, 4, "m³/s/m"),
    )?;
    Ok(())
}

fn run_carbonate(args: &CarbonateArgs, json: bool) -> anyhow::Result<()> {
    let state = carbonate::solve(&args.into()).context("error solving carbonate system")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let mut metrics = ConsoleMetrics::stdout();
    metrics.display("pH (total scale)", &format_metric(state.ph_total, 3, ""))?;
    metrics.display(
        "Carbonate Ion",
        &format_metric(state.co3_umol_kg, 1, "µmol/kg"),
    )?;
    metrics.display(
        "Ωₐ (Aragonite Saturation State)",
        &format_metric(state.omega_aragonite, 2, ""),
    )?;
    Ok(())
}

fn run_shoreline(args: &ShorelineArgs, json: bool) -> anyhow::Result<()> {
    let retreat = shoreline::project_retreat(args.rate, args.years)
        .context("error projecting shoreline change")?;

    if json {
        let report = serde_json::json!({
            "years": args.years,
            "rate_m_per_year": args.rate,
            "retreat_m": retreat,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ConsoleMetrics::stdout().display(
        "Projected Shoreline Retreat",
        &format_metric(retreat, 2, "meters"),
    )?;
    Ok(())
}
