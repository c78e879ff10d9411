// climalert CLI - seasonal temperature anomaly detection

use clap::{Parser, Subcommand};
use climalert_anomaly::config::{load_config, AnomalyConfig};
use climalert_anomaly::{AnalysisReport, AnalysisRunner, LabeledObservation, LiveCheck, Verdict};
use climalert_core::parser::load_dataset;
use climalert_core::{LiveReading, Season};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "climalert")]
#[command(version = "0.1.0")]
#[command(about = "Seasonal temperature anomaly detection", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset format (csv, json)
    #[arg(short, long, global = true, default_value = "csv")]
    format: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print verdicts as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary statistics, seasonal baselines and anomaly count
    Analyze {
        /// Historical dataset (city, timestamp, temperature[, season])
        file: PathBuf,
    },

    /// List the cities in a dataset
    Cities {
        file: PathBuf,
    },

    /// Seasonal temperature profile of one city
    Profile {
        file: PathBuf,

        #[arg(long)]
        city: String,
    },

    /// Judge a temperature you supply against a city's history
    Classify {
        file: PathBuf,

        #[arg(long)]
        city: String,

        #[arg(short, long, allow_negative_numbers = true)]
        temperature: f64,

        /// Season of the reading (default: current season)
        #[arg(short, long, value_parser = parse_season)]
        season: Option<Season>,
    },

    /// Fetch the current temperature and judge it against history
    Check {
        file: PathBuf,

        #[arg(long)]
        city: String,

        /// OpenWeatherMap API key (or set OPENWEATHER_API_KEY)
        #[arg(short = 'k', long, env = "OPENWEATHER_API_KEY")]
        api_key: Option<String>,
    },

    /// Write the labeled series as CSV for charting
    Export {
        file: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Only export this city
        #[arg(long)]
        city: Option<String>,
    },
}

fn parse_season(s: &str) -> Result<Season, String> {
    Season::parse(s).ok_or_else(|| format!("unknown season '{}' (winter, spring, summer, autumn)", s))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnomalyConfig::default(),
    };
    let mut runner = AnalysisRunner::new(&config)?;

    let file = match &cli.command {
        Commands::Analyze { file }
        | Commands::Cities { file }
        | Commands::Profile { file, .. }
        | Commands::Classify { file, .. }
        | Commands::Check { file, .. }
        | Commands::Export { file, .. } => file,
    };

    info!(file = %file.display(), format = %cli.format, "Loading dataset");
    let observations = load_dataset(file, &cli.format)?;
    let report = runner.analyze(observations)?;

    match cli.command {
        Commands::Analyze { .. } => {
            show_analysis(&report);
        }
        Commands::Cities { .. } => {
            show_cities(&report);
        }
        Commands::Profile { city, .. } => {
            require_city(&report, &city)?;
            show_profile(&report, &city);
        }
        Commands::Classify {
            city,
            temperature,
            season,
            ..
        } => {
            let season = season.unwrap_or_else(Season::current);
            let check = runner.evaluate(&report, LiveReading::new(city, temperature, season));
            print_check(&check, cli.json)?;
        }
        Commands::Check { city, api_key, .. } => {
            if let Some(key) = api_key {
                runner = runner.with_api_key(key);
            }
            require_city(&report, &city)?;
            check_live(&runner, &report, &city, cli.json).await?;
        }
        Commands::Export { output, city, .. } => {
            if let Some(city) = &city {
                require_city(&report, city)?;
            }
            export_series(&report, &output, city.as_deref())?;
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string())
}

fn show_analysis(report: &AnalysisReport) {
    println!("\n{}", "📊 Dataset Overview".cyan().bold());
    println!("{}", "─".repeat(50).dimmed());

    if let Some(summary) = &report.summary {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Statistic", "Temperature"]);
        table.add_row(vec!["count".to_string(), summary.count.to_string()]);
        table.add_row(vec!["mean".to_string(), format!("{:.2}", summary.mean)]);
        table.add_row(vec!["std".to_string(), fmt_opt(summary.std)]);
        table.add_row(vec!["min".to_string(), format!("{:.2}", summary.min)]);
        table.add_row(vec!["25%".to_string(), format!("{:.2}", summary.q25)]);
        table.add_row(vec!["50%".to_string(), format!("{:.2}", summary.median)]);
        table.add_row(vec!["75%".to_string(), format!("{:.2}", summary.q75)]);
        table.add_row(vec!["max".to_string(), format!("{:.2}", summary.max)]);
        println!("{table}");
        println!("  {} {}", "Cities:".dimmed(), summary.cities.to_string().cyan());
    }

    println!("\n{}", "Seasonal baselines".cyan().bold());
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["City", "Season", "Mean", "Std", "Count"]);
    for b in report.baselines.iter() {
        table.add_row(vec![
            b.location.clone(),
            b.season.to_string(),
            format!("{:.2}", b.mean),
            fmt_opt(b.sample_std),
            b.count.to_string(),
        ]);
    }
    println!("{table}");

    let anomalies = report.anomaly_count();
    let count = if anomalies > 0 {
        anomalies.to_string().red().bold()
    } else {
        anomalies.to_string().green()
    };
    println!("\n{} {} anomalies found in the data", "Total:".dimmed(), count);

    if let Some(summary) = &report.summary {
        if summary.unlabeled > 0 {
            println!("  {} {} observations without a baseline", "⚠".yellow(), summary.unlabeled);
        }
    }
    println!();
}

fn show_cities(report: &AnalysisReport) {
    for city in report.cities() {
        println!("{}", city);
    }
}

fn require_city(report: &AnalysisReport, city: &str) -> Result<(), String> {
    if report.baselines.for_location(city).is_empty() {
        return Err(format!("City '{}' not found in dataset", city));
    }
    Ok(())
}

fn show_profile(report: &AnalysisReport, city: &str) {
    println!("\n{} {}", "🌡 Seasonal profile:".cyan().bold(), city.bold());
    println!("{}", "─".repeat(50).dimmed());

    let anomalies = report.anomalies_for(city);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Season", "Mean", "Std", "Min", "Max", "Count", "Anomalies"]);
    for b in report.seasonal_profile(city) {
        let in_season = anomalies
            .iter()
            .filter(|l| l.observation.season == b.season)
            .count();
        table.add_row(vec![
            b.season.to_string(),
            format!("{:.2}", b.mean),
            fmt_opt(b.sample_std),
            format!("{:.2}", b.min),
            format!("{:.2}", b.max),
            b.count.to_string(),
            in_season.to_string(),
        ]);
    }
    println!("{table}");

    let series = report.city_series(city);
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        println!(
            "  {} {} → {}",
            "Period:".dimmed(),
            first.observation.timestamp.format("%Y-%m-%d"),
            last.observation.timestamp.format("%Y-%m-%d")
        );
    }
    if let Some(trend) = series.iter().rev().find_map(|l| l.smoothed_temperature) {
        println!("  {} {:.2}", "Latest smoothed:".dimmed(), trend);
    }
    println!();
}

fn show_verdict(check: &LiveCheck) {
    let reading = &check.reading;
    println!(
        "\n{} {}: {:.1}°C ({})",
        "Weather in".dimmed(),
        reading.location.cyan(),
        reading.temperature,
        reading.observed_season
    );

    match check.verdict {
        Verdict::Anomalous => println!("  {} {}", "⚠".red(), "anomalous".red().bold()),
        Verdict::Normal => println!("  {} {}", "✓".green(), "not anomalous".green()),
        Verdict::NoBaseline => println!(
            "  {} {}",
            "?".yellow(),
            "not enough history for this season to judge".yellow()
        ),
    }

    if let Some(band) = &check.band {
        println!("  {} [{:.2}, {:.2}]", "Normal range:".dimmed(), band.lower, band.upper);
    }
    println!();
}

fn print_check(check: &LiveCheck, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(check)?);
    } else {
        show_verdict(check);
    }
    Ok(())
}

async fn check_live(
    runner: &AnalysisRunner,
    report: &AnalysisReport,
    city: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // a failed lookup is an error, never a verdict
    let check = runner
        .check_city(report, city)
        .await
        .map_err(|e| format!("Weather lookup failed: {}", e))?;
    print_check(&check, json)?;
    Ok(())
}

// flat row for charting tools
#[derive(Serialize)]
struct ExportRow<'a> {
    city: &'a str,
    timestamp: String,
    season: Season,
    temperature: f64,
    mean: Option<f64>,
    sample_std: Option<f64>,
    is_anomaly: Option<bool>,
    smoothed_temperature: Option<f64>,
}

impl<'a> From<&'a LabeledObservation> for ExportRow<'a> {
    fn from(l: &'a LabeledObservation) -> Self {
        Self {
            city: &l.observation.location,
            timestamp: l.observation.timestamp.to_rfc3339(),
            season: l.observation.season,
            temperature: l.observation.temperature,
            mean: l.mean,
            sample_std: l.sample_std,
            is_anomaly: l.is_anomaly,
            smoothed_temperature: l.smoothed_temperature,
        }
    }
}

fn write_series<'a, W: Write>(
    writer: W,
    rows: impl IntoIterator<Item = &'a LabeledObservation>,
) -> Result<usize, csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    let mut written = 0;
    for row in rows {
        out.serialize(ExportRow::from(row))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

fn export_series(
    report: &AnalysisReport,
    output: &Path,
    city: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(output)?;
    let written = match city {
        Some(city) => write_series(file, report.city_series(city))?,
        None => write_series(file, &report.labeled)?,
    };

    println!(
        "{} Wrote {} rows to {}",
        "✓".green().bold(),
        written,
        output.display()
    );
    Ok(())
}
