//! `idromon` command line.
//!
//! Lists stations with their alert status and shows a station's recent
//! readings against its thresholds. Fetch failures are reported on stderr
//! and the process exits non-zero.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use idromon_service::alert::thresholds::resolve_effective_thresholds;
use idromon_service::analysis::series::normalize_series;
use idromon_service::config::Config;
use idromon_service::dev_mode::FixtureSource;
use idromon_service::ingest::StationSource;
use idromon_service::ingest::allerta::AllertaClient;
use idromon_service::ingest::lookback::find_latest_populated;
use idromon_service::logging::{self, DataSource, LogLevel};
use idromon_service::model::{FetchError, Station};
use idromon_service::render::{self, RenderContext, Theme};
use idromon_service::stations::{build_cards, require_station};

#[derive(Parser)]
#[command(name = "idromon", version, about = "Hydrometric station levels and alert thresholds")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Replay recorded responses from this directory instead of the live API
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Dark)]
    theme: Theme,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stations with their status
    Stations {
        /// Snapshot instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List stations from the most recent snapshot with enough readings
    Latest,
    /// Show the time series of one station
    Series {
        station_id: String,
        /// Snapshot used to look the station up (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] idromon_service::config::ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to open log file: {0}")]
    Log(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init_logger(
        LogLevel::from_name(&config.logging.level),
        config.logging.file.as_deref(),
    )?;

    let source: Box<dyn StationSource> = match &cli.fixtures {
        Some(dir) => {
            logging::info(DataSource::Fixtures, None, &format!("replaying from {}", dir.display()));
            Box::new(FixtureSource::new(dir))
        }
        None => Box::new(AllertaClient::new(&config.source)?),
    };

    let ctx = RenderContext {
        theme: cli.theme,
        ansi: !cli.json && std::io::stdout().is_terminal(),
    };

    match cli.command {
        Command::Stations { at } => {
            let stations = fetch_snapshot(source.as_ref(), at)?;
            print_cards(&stations, &ctx, cli.json)
        }
        Command::Latest => {
            let snapshot = find_latest_populated(source.as_ref(), &config.lookback)
                .inspect_err(|e| {
                    logging::log_fetch_failure(DataSource::Stations, None, "latest snapshot", e);
                })?;
            if !cli.json {
                println!("snapshot at {}\n", snapshot.at.to_rfc3339());
            }
            print_cards(&snapshot.stations, &ctx, cli.json)
        }
        Command::Series { station_id, at } => {
            let stations = fetch_snapshot(source.as_ref(), at)?;
            let station = require_station(&stations, &station_id).inspect_err(|e| {
                logging::log_fetch_failure(DataSource::Stations, Some(&station_id), "station lookup", e);
            })?;
            print_series(source.as_ref(), station, &ctx, cli.json)
        }
    }
}

fn fetch_snapshot(source: &dyn StationSource, at: Option<DateTime<Utc>>) -> Result<Vec<Station>, FetchError> {
    let result = match at {
        Some(at) => source.fetch_stations_at(at),
        None => source.fetch_stations_now(),
    };
    result.inspect_err(|e| {
        logging::log_fetch_failure(DataSource::Stations, None, "fetch stations", e);
    })
}

fn print_cards(stations: &[Station], ctx: &RenderContext, json: bool) -> Result<(), CliError> {
    let cards = build_cards(stations);
    if json {
        println!("{}", render::cards_json(&cards)?);
    } else {
        print!("{}", render::render_cards(&cards, ctx));
    }
    Ok(())
}

fn print_series(
    source: &dyn StationSource,
    station: &Station,
    ctx: &RenderContext,
    json: bool,
) -> Result<(), CliError> {
    let raw = source.fetch_time_series(station).inspect_err(|e| {
        logging::log_fetch_failure(DataSource::TimeSeries, Some(&station.station_id), "fetch series", e);
    })?;

    let thresholds = resolve_effective_thresholds(station);
    let points = normalize_series(&raw, &thresholds);

    if json {
        println!("{}", render::series_json(station, &points)?);
    } else {
        print!("{}", render::render_series(station, &points, ctx));
    }
    Ok(())
}
