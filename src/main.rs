use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tartex_runner::app::headless::{self, HeadlessHost, HeadlessOptions};
use tartex_runner::app::run_tui;
use tartex_runner::config::Config;
use tartex_runner::context::ContextSnapshot;
use tartex_runner::host::RecentFilesStore;
use tartex_runner::job::JobBoard;
use tartex_runner::logging::{self, LogSink};
use tartex_runner::search::SeverityFilter;
use tartex_runner::ui::{App, TuiHost};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "tartex-runner",
    about = "Package a LaTeX project with tartex and browse what went wrong",
    version
)]
struct Args {
    /// File to archive: a .tex source or a .fls recorder file
    paths: Vec<PathBuf>,

    /// Run once without the TUI and print the result
    #[arg(long)]
    no_tui: bool,

    /// Headless: only print errors
    #[arg(long, conflicts_with = "warnings_only")]
    errors_only: bool,

    /// Headless: only print warnings
    #[arg(long)]
    warnings_only: bool,

    /// Headless: only print diagnostics containing this text
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Headless: open the compilation log after a LaTeX failure
    #[arg(long)]
    open_log: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug`
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  Warning: {}. Using default settings.", e);
            Config::default()
        }
    };

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let sink = if args.no_tui {
        LogSink::Stderr
    } else {
        match logging::default_log_path() {
            Some(path) => LogSink::File(path),
            None => LogSink::Stderr,
        }
    };
    if let Err(e) = logging::init(&level, sink) {
        eprintln!("  Warning: {:#}", e);
    }

    let rules = Arc::new(config.compile_rules()?);
    let ctx = Arc::new(
        ContextSnapshot::capture(&config.tool).context("Failed to read the working directory")?,
    );
    info!(
        session = %ctx.session_id,
        pid = ctx.pid,
        user = ctx.user.as_deref().unwrap_or("-"),
        captured_at = %ctx.captured_at.to_rfc3339(),
        tool = %config.tool,
        tool_path = ?ctx.tool_path,
        launch_dir = %ctx.launch_dir.display(),
        "starting"
    );
    if ctx.tool_path.is_none() {
        warn!(tool = %config.tool, "tool not found on PATH");
    }

    let recent = RecentFilesStore::default_path()
        .map(|path| RecentFilesStore::open(path, config.recent_files_limit));
    let launch_dir = ctx.launch_dir.clone();
    let board = JobBoard::new(ctx, Arc::new(config), rules);

    if args.no_tui {
        let severity = if args.errors_only {
            SeverityFilter::ErrorsOnly
        } else if args.warnings_only {
            SeverityFilter::WarningsOnly
        } else {
            SeverityFilter::All
        };
        let options = HeadlessOptions {
            severity,
            search: args.search,
            open_log: args.open_log,
        };
        let host = HeadlessHost::new(launch_dir, recent);
        let code = match headless::run_headless(board, host, &args.paths, options).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                2
            }
        };
        std::process::exit(code);
    }

    let host = TuiHost::new(launch_dir, recent);
    run_tui(App::new(board, host, args.paths)).await
}
