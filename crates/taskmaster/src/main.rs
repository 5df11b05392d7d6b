//! CLI entry point for taskmaster.

use std::convert::Infallible;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use taskmaster_app::{AppConfig, ExportFormat, SystemClock, TaskService, parse_due_date};
use taskmaster_core::view::{FilterMode, SortKey};
use taskmaster_store_json::JsonFileStore;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Personal task list stored in a local JSON file.
#[derive(Parser, Debug)]
#[command(name = "taskmaster", version, about = "taskmaster: a single-user task list")]
struct Cli {
    /// Task file (defaults to the config value, then the platform data directory).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file (defaults to <config dir>/taskmaster/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// 1 (low) to 5 (critical).
        #[arg(short = 'p', long, default_value_t = 1)]
        priority: u8,
        /// YYYY-MM-DD or RFC 3339.
        #[arg(long, value_parser = parse_due_date)]
        due: Option<OffsetDateTime>,
        #[arg(short = 'c', long)]
        category: Option<String>,
    },

    /// Change fields of an existing task; omitted fields keep their value.
    Edit {
        /// Full id or unique prefix.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<u8>,
        #[arg(long, value_parser = parse_due_date, conflicts_with = "clear_due")]
        due: Option<OffsetDateTime>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(short = 'c', long)]
        category: Option<String>,
    },

    /// Delete a task.
    Rm {
        /// Full id or unique prefix.
        id: String,
    },

    /// Mark a task completed, or open again.
    Toggle {
        /// Full id or unique prefix.
        id: String,
    },

    /// Print one task as JSON.
    Show {
        /// Full id or unique prefix.
        id: String,
    },

    /// List tasks through search, filter and sort.
    Ls {
        #[arg(short = 's', long)]
        search: Option<String>,
        /// title, priority, createdAt, dueDate or category; anything else means createdAt.
        #[arg(long, value_parser = lossy_sort_key)]
        sort: Option<SortKey>,
        /// all, completed, pending or high-priority; anything else means all.
        #[arg(long, value_parser = lossy_filter_mode)]
        filter: Option<FilterMode>,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Summary counts and recent activity.
    Stats,

    /// Write a backup of every task.
    Export {
        /// json or markdown.
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Output directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[allow(clippy::unnecessary_wraps)]
fn lossy_sort_key(raw: &str) -> Result<SortKey, Infallible> {
    Ok(SortKey::from_name_lossy(raw))
}

#[allow(clippy::unnecessary_wraps)]
fn lossy_filter_mode(raw: &str) -> Result<FilterMode, Infallible> {
    Ok(FilterMode::from_name_lossy(raw))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LsFormat {
    #[default]
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { data, config, cmd } = Cli::parse();
    install_tracing();

    let config = AppConfig::load(config.as_deref())?;
    let path = config.data_path(data.as_deref())?;
    tracing::debug!(path = %path.display(), "Using task file");
    let store = JsonFileStore::new(path);
    let mut service = TaskService::open(store, SystemClock, config.view.initial_state());

    let outcome = commands::run(cmd, &mut service, &config, &mut io::stdout().lock());
    let closed = service.close().context("failed to save tasks");
    outcome?;
    closed
}

fn install_tracing() {
    // RUST_LOG overrides the default INFO level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
