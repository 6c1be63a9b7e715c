// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gridsync - scheduled ingestion of Turkish grid data.
//!
//! This is the binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use gridsync::bootstrap::{open_credentials, open_pipeline};
use gridsync::history;
use gridsync::schedule::run_schedule;
use gridsync::shutdown::install_signal_handler;
use gridsync::SourceKind;
use gridsync_config::GridsyncConfig;
use gridsync_core::{CredentialStatus, GridsyncError, parse_timestamp};
use gridsync_sources::{FetchWindow, parse_utc_offset};
use gridsync_storage::SqliteRecordStore;

/// Gridsync - scheduled ingestion of Turkish grid data.
#[derive(Parser, Debug)]
#[command(name = "gridsync", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch, normalize and store data once.
    Run(RunArgs),
    /// Inspect or manage the cached session ticket.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Run on the configured cron expression until interrupted.
    Schedule,
    /// Read stored data back.
    Show {
        #[command(subcommand)]
        view: ShowView,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Which source to pull.
    #[arg(long, value_enum, default_value_t = SourceArg::All)]
    source: SourceArg,

    /// Start of the EPIAS window (RFC 3339). Defaults to yesterday 00:00.
    #[arg(long, value_parser = parse_cli_timestamp, requires = "end")]
    start: Option<DateTime<Utc>>,

    /// End of the EPIAS window (RFC 3339). Defaults to yesterday 23:00.
    #[arg(long, value_parser = parse_cli_timestamp, requires = "start")]
    end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Epias,
    Power,
    Carbon,
    All,
}

impl SourceArg {
    fn kinds(self) -> Vec<SourceKind> {
        match self {
            SourceArg::Epias => vec![SourceKind::Epias],
            SourceArg::Power => vec![SourceKind::Power],
            SourceArg::Carbon => vec![SourceKind::Carbon],
            SourceArg::All => SourceKind::all(),
        }
    }
}

/// Collection selector for read commands; unlike `run`, exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CollectionArg {
    Epias,
    Power,
    Carbon,
}

impl From<CollectionArg> for SourceKind {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Epias => SourceKind::Epias,
            CollectionArg::Power => SourceKind::Power,
            CollectionArg::Carbon => SourceKind::Carbon,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ShowView {
    /// Most recent records, newest first.
    Latest {
        #[arg(long, value_enum)]
        source: CollectionArg,
        /// Only this zone (power and carbon).
        #[arg(long)]
        zone: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Records between two instants, inclusive, oldest first.
    Range {
        #[arg(long, value_enum)]
        source: CollectionArg,
        #[arg(long, value_parser = parse_cli_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_cli_timestamp)]
        end: DateTime<Utc>,
        #[arg(long)]
        zone: Option<String>,
    },
    /// Count, average, minimum and maximum of a numeric field.
    Stats {
        #[arg(long, value_enum)]
        source: CollectionArg,
        /// Field to summarize. Defaults to the source's headline value.
        #[arg(long)]
        field: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AuthAction {
    /// Show the cached ticket without contacting the network.
    Status,
    /// Obtain a valid ticket, fetching only if the cached one is unusable.
    Refresh,
    /// Forget the cached ticket.
    Clear,
}

fn parse_cli_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(text).ok_or_else(|| format!("`{text}` is not a timestamp"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => gridsync_config::load_and_validate_path(path),
        None => gridsync_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            gridsync_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Run(args) => run(&config, args).await,
        Commands::Auth { action } => auth(&config, action).await,
        Commands::Schedule => schedule(&config).await,
        Commands::Show { view } => show(&config, view).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `gridsync run`. Returns `Ok(false)` when any source failed.
async fn run(config: &GridsyncConfig, args: RunArgs) -> Result<bool, GridsyncError> {
    let window = match (args.start, args.end) {
        (Some(start), Some(end)) => {
            let offset = parse_utc_offset(&config.epias.utc_offset)?;
            Some(FetchWindow::new(start, end, offset)?)
        }
        _ => None,
    };

    let (pipeline, store) = open_pipeline(config).await?;
    let summary = pipeline.run(&args.source.kinds(), window).await;
    print!("{summary}");
    store.close().await?;

    Ok(summary.is_success())
}

async fn auth(config: &GridsyncConfig, action: AuthAction) -> Result<bool, GridsyncError> {
    let manager = open_credentials(config).await?;
    match action {
        AuthAction::Status => {}
        AuthAction::Refresh => {
            manager.get_valid_credential().await?;
        }
        AuthAction::Clear => {
            manager.invalidate().await;
        }
    }
    print_status(&manager.status().await);
    Ok(true)
}

fn print_status(status: &CredentialStatus) {
    if !status.valid {
        println!("credential: none");
        return;
    }
    println!("credential: valid");
    if let Some(preview) = &status.token_preview {
        println!("  token:      {preview}");
    }
    if let Some(expires_at) = status.expires_at {
        println!("  expires at: {}", expires_at.to_rfc3339());
    }
    if let Some(remaining) = status.time_remaining {
        println!("  remaining:  {}m", remaining.num_minutes());
    }
}

async fn schedule(config: &GridsyncConfig) -> Result<bool, GridsyncError> {
    let (pipeline, store) = open_pipeline(config).await?;
    let cancel = install_signal_handler();
    let result = run_schedule(&pipeline, &config.schedule, cancel).await;
    store.close().await?;
    result.map(|()| true)
}

async fn show(config: &GridsyncConfig, view: ShowView) -> Result<bool, GridsyncError> {
    let store = SqliteRecordStore::open(&config.storage).await?;
    match view {
        ShowView::Latest { source, zone, limit } => {
            let rows = history::latest(&store, source.into(), zone.as_deref(), limit).await?;
            rows.iter().for_each(|row| println!("{}", history::render_record(row)));
        }
        ShowView::Range {
            source,
            start,
            end,
            zone,
        } => {
            let rows = history::range(&store, source.into(), start, end, zone.as_deref()).await?;
            rows.iter().for_each(|row| println!("{}", history::render_record(row)));
        }
        ShowView::Stats { source, field } => {
            for summary in history::stats(&store, source.into(), field.as_deref()).await? {
                println!("{summary}");
            }
        }
    }
    store.close().await?;
    Ok(true)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gridsync={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
