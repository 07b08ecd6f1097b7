use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use draft::config::{generate_sample_config, Config};
use draft::filter::DropoutType;
use draft::handler::{self, HandlerError};
use draft::ingest;

const DEFAULT_LOG_FILTER: &str = "draft=info";

/// Draft a line-up from a player pool with a genetic algorithm
#[derive(Parser, Debug)]
#[command(name = "draft", version, about)]
struct Cli {
    /// Draft request JSON file
    #[arg(required_unless_present = "write_config")]
    request: Option<PathBuf>,

    /// YAML configuration file (defaults to config.yaml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Player pool (.json or .csv) replacing the request's players
    #[arg(long)]
    players: Option<PathBuf>,

    /// Random seed for a reproducible draft
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    generations: Option<usize>,

    #[arg(long)]
    population: Option<usize>,

    /// Only draft players whose match is on this day (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Share of the pool to drop before drafting, in [0, 1)
    #[arg(long)]
    dropout: Option<f64>,

    #[arg(long, value_enum)]
    dropout_type: Option<DropoutType>,

    /// Write a sample configuration to this path and exit
    #[arg(long)]
    write_config: Option<String>,

    /// Write the response here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.write_config {
        return match fs::write(path, generate_sample_config()) {
            Ok(()) => {
                println!("Sample configuration written to {}", path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to write {}: {}", path, e);
                ExitCode::FAILURE
            }
        };
    }

    let log_filter = init_logging();
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Ok(Config::load_or_default(None)),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(event = "config_error", "{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(handle) = log_filter {
        if let Err(e) = handle.reload(EnvFilter::new(&config.runtime.log_level)) {
            warn!("could not apply runtime.log_level: {}", e);
        }
    }

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(event = "draft_failed", "{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the subscriber before anything logs. Until the configuration is read, the filter
/// comes from RUST_LOG or the default; the returned handle swaps in `runtime.log_level` when
/// RUST_LOG is unset.
fn init_logging() -> Option<reload::Handle<EnvFilter, Registry>> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let env_set = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER)));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    (!env_set).then_some(handle)
}

fn run(cli: &Cli, mut config: Config) -> Result<(), HandlerError> {
    if let Some(seed) = cli.seed {
        config.ga.seed = Some(seed);
    }
    if let Some(generations) = cli.generations {
        config.ga.generations = generations;
    }
    if let Some(population) = cli.population {
        config.ga.population_size = population;
    }

    let threads = config.runtime.thread_count();
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("could not size the thread pool: {}", e);
    }

    let Some(request_path) = &cli.request else {
        return Ok(());
    };
    let mut request = handler::load_request(request_path)?;
    if let Some(path) = &cli.players {
        request.players = ingest::load_records(path)?;
    }
    if cli.date.is_some() {
        request.date = cli.date;
    }
    if let Some(dropout) = cli.dropout {
        request.dropout = dropout;
    }
    if let Some(dropout_type) = cli.dropout_type {
        request.dropout_type = dropout_type;
    }
    info!(
        event = "request_loaded",
        path = %request_path.display(),
        players = request.players.len(),
        threads,
    );

    let progress = config.runtime.progress.then(|| {
        let bar = ProgressBar::new(config.ga.generations as u64);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} generations",
        ));
        bar
    });

    let response = handler::handle_with_progress(request, &config.ga, progress)?;
    let json = serde_json::to_string_pretty(&response)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(event = "response_written", path = %path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
