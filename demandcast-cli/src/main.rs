//! DemandCast CLI: inspect, trend, forecast and sample commands.
//!
//! Commands:
//! - `inspect`: summarize a sales CSV (records, dates, regions, categories)
//! - `trend`: daily totals for the recent-sales view
//! - `forecast`: forecast a filtered selection, evaluate alerts, save artifacts
//! - `sample`: write a deterministic synthetic sales CSV
//!
//! Logs go to stderr; tables and `--json` output go to stdout.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use demandcast_core::{DailyAggregate, Dataset, FilterCriteria, ForecastField, Measure};
use demandcast_runner::{
    run_forecast, run_trend, save_artifacts, write_sample_csv, DatasetSession, ForecastOutcome,
    ForecastRequest, PipelineConfig, SampleOptions,
};

#[derive(Parser)]
#[command(
    name = "demandcast",
    version,
    about = "DemandCast CLI: sales trend and demand forecasting"
)]
struct Cli {
    /// Path to a TOML config file. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// Sales CSV with Date, Region, Product_Category, Units_Sold (and optionally Revenue).
    #[arg(long)]
    input: PathBuf,

    /// Keep only these regions (repeatable). Omit for all regions.
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Keep only these product categories (repeatable). Omit for all.
    #[arg(long = "category")]
    categories: Vec<String>,
}

impl SelectionArgs {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::all();
        if !self.regions.is_empty() {
            criteria = criteria.with_regions(self.regions.iter().cloned());
        }
        if !self.categories.is_empty() {
            criteria = criteria.with_categories(self.categories.iter().cloned());
        }
        criteria
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a sales CSV.
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print daily totals for the recent-sales view.
    Trend {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Trailing window in days. Defaults to the config value (7).
        #[arg(long, conflicts_with = "all_dates")]
        window_days: Option<NonZeroU32>,

        /// Show every date instead of a trailing window.
        #[arg(long, default_value_t = false)]
        all_dates: bool,
    },
    /// Forecast the filtered selection and evaluate alerts.
    Forecast {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Days to forecast past the last observed date.
        #[arg(long)]
        horizon: Option<NonZeroU32>,

        /// Forecast backend: linear, holt, naive.
        #[arg(long)]
        backend: Option<String>,

        /// Quantity to forecast: units or revenue.
        #[arg(long)]
        measure: Option<Measure>,

        /// Alert on forecast values strictly above this threshold.
        #[arg(long)]
        threshold: Option<f64>,

        /// Forecast column compared against the threshold: point, lower, upper.
        #[arg(long)]
        alert_field: Option<ForecastField>,

        /// Save manifest, CSV and reports under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a deterministic synthetic sales CSV.
    Sample {
        #[arg(long)]
        output: PathBuf,

        /// Number of days to generate.
        #[arg(long, default_value_t = 90)]
        days: u32,

        /// First date (YYYY-MM-DD). Defaults to 2024-01-01.
        #[arg(long)]
        start: Option<String>,

        /// Seed string; the same seed always produces the same file.
        #[arg(long, default_value = "demandcast")]
        seed: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        Commands::Inspect { input } => run_inspect(&input, cli.json),
        Commands::Trend {
            selection,
            window_days,
            all_dates,
        } => {
            let window = if all_dates {
                None
            } else {
                window_days.or(config.trend.window_days)
            };
            run_trend_cmd(&selection, window, cli.json)
        }
        Commands::Forecast {
            selection,
            horizon,
            backend,
            measure,
            threshold,
            alert_field,
            output_dir,
        } => {
            let mut request = ForecastRequest::from_config(&config, selection.criteria());
            if let Some(h) = horizon {
                request.horizon_days = h;
            }
            if let Some(b) = backend {
                request.backend = b;
            }
            if let Some(m) = measure {
                request.measure = m;
            }
            if threshold.is_some() {
                request.threshold = threshold;
            }
            if let Some(f) = alert_field {
                request.alert_field = f;
            }
            run_forecast_cmd(&selection.input, &request, &config, output_dir.as_deref(), cli.json)
        }
        Commands::Sample {
            output,
            days,
            start,
            seed,
        } => run_sample(&output, days, start, seed),
    }
}

/// RUST_LOG wins when set; otherwise `level` applies to the demandcast crates.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let default_directive =
        format!("demandcast={level},demandcast_core={level},demandcast_runner={level}");
    let filter_directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(input: &Path) -> Result<std::sync::Arc<Dataset>> {
    let mut session = DatasetSession::new();
    session
        .load_path(input)
        .with_context(|| format!("failed to load {}", input.display()))
}

fn run_inspect(input: &Path, json: bool) -> Result<()> {
    let ds = load(input)?;
    let range = ds.date_range();

    if json {
        let summary = serde_json::json!({
            "records": ds.len(),
            "start_date": range.map(|r| r.0),
            "end_date": range.map(|r| r.1),
            "regions": ds.regions(),
            "categories": ds.categories(),
            "has_revenue": ds.has_revenue,
            "fingerprint": ds.fingerprint,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("=== Dataset ===");
    println!("File:        {}", input.display());
    println!("Records:     {}", ds.len());
    match range {
        Some((start, end)) => println!("Period:      {start} to {end}"),
        None => println!("Period:      (empty)"),
    }
    println!("Regions:     {}", ds.regions().join(", "));
    println!("Categories:  {}", ds.categories().join(", "));
    println!("Revenue:     {}", if ds.has_revenue { "yes" } else { "no" });
    println!("Fingerprint: {}", ds.fingerprint);
    println!();
    Ok(())
}

fn run_trend_cmd(selection: &SelectionArgs, window: Option<NonZeroU32>, json: bool) -> Result<()> {
    let ds = load(&selection.input)?;
    let mut criteria = selection.criteria();
    criteria.window_days = window;

    let daily = run_trend(&ds, &criteria);

    if json {
        println!("{}", serde_json::to_string_pretty(&daily)?);
        return Ok(());
    }

    if daily.is_empty() {
        println!("No sales match the selection.");
        return Ok(());
    }
    print_daily(&daily, ds.has_revenue);
    Ok(())
}

fn print_daily(daily: &[DailyAggregate], has_revenue: bool) {
    if has_revenue {
        println!("{:<12} {:>12} {:>14}", "Date", "Units Sold", "Revenue");
        println!("{}", "-".repeat(40));
        for d in daily {
            println!(
                "{:<12} {:>12.2} {:>14.2}",
                d.date.to_string(),
                d.units_sold_total,
                d.revenue_total
            );
        }
    } else {
        println!("{:<12} {:>12}", "Date", "Units Sold");
        println!("{}", "-".repeat(25));
        for d in daily {
            println!("{:<12} {:>12.2}", d.date.to_string(), d.units_sold_total);
        }
    }
}

fn run_forecast_cmd(
    input: &Path,
    request: &ForecastRequest,
    config: &PipelineConfig,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let ds = load(input)?;
    let outcome = run_forecast(&ds, request, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_forecast(&outcome);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&outcome, dir, &config.export.csv_filename)?;
        // Keep stdout valid JSON in --json mode.
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_forecast(outcome: &ForecastOutcome) {
    let table = &outcome.table;
    let future = outcome.future_rows();

    println!();
    println!("=== Forecast ===");
    println!("Backend:   {}", table.backend);
    println!("Measure:   {}", table.measure);
    println!("History:   {} date(s)", table.history_len);
    println!("Horizon:   {} day(s)", table.horizon);
    println!();

    if table.bounds_supplied {
        println!(
            "{:<12} {:>12} {:>12} {:>12}",
            "Date", "Forecast", "Lower", "Upper"
        );
        println!("{}", "-".repeat(51));
        for row in future {
            println!(
                "{:<12} {:>12.2} {:>12.2} {:>12.2}",
                row.date.to_string(),
                row.point_estimate,
                row.lower_bound,
                row.upper_bound
            );
        }
    } else {
        println!("{:<12} {:>12}", "Date", "Forecast");
        println!("{}", "-".repeat(25));
        for row in future {
            println!("{:<12} {:>12.2}", row.date.to_string(), row.point_estimate);
        }
        println!();
        println!("NOTE: backend '{}' does not provide bounds", table.backend);
    }

    if let Some(threshold) = outcome.request.threshold {
        println!();
        if outcome.alerts.is_empty() {
            println!("No forecast values exceed {threshold:.2}.");
        } else {
            println!("--- Alerts ({} > {threshold:.2}) ---", outcome.request.alert_field.label());
            for alert in &outcome.alerts {
                println!("ALERT: {} {:.2}", alert.date, alert.value);
            }
        }
    }
    println!();
}

fn run_sample(output: &Path, days: u32, start: Option<String>, seed: String) -> Result<()> {
    let mut opts = SampleOptions {
        days,
        seed,
        ..SampleOptions::default()
    };
    if let Some(s) = start.as_deref() {
        opts.start = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --start date '{s}'"))?;
    }

    write_sample_csv(output, &opts)?;
    println!("Sample dataset written to: {}", output.display());
    Ok(())
}
