use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use pr_monitor::config::loader;
use pr_monitor::engine::SyncEngine;
use pr_monitor::github::GitHubRemote;
use pr_monitor::server::{self, DashboardService};
use pr_monitor::store::SharedStore;

#[derive(Parser)]
#[command(
    name = "pr-monitor",
    version,
    about = "Mirror a repository's pull requests into a live triage dashboard"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides `[server] port`).
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    match cli.log_file {
        Some(ref path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        eprintln!("{info}\n\n{backtrace}");
    }));

    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = loader::load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    // Install the rustls CryptoProvider before any TLS client is constructed.
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("failed to install default CryptoProvider");

    let runtime = tokio::runtime::Runtime::new().context("tokio runtime init")?;
    let _guard = runtime.enter();

    let data_dir = loader::data_dir(&config)?;
    let store = Arc::new(
        SharedStore::open(&data_dir)
            .with_context(|| format!("opening store in {}", data_dir.display()))?,
    );

    // The synchronizer owns its own thread and runtime; the dashboard keeps
    // serving from the last committed state however long a cycle takes.
    let remote = GitHubRemote::connect(&config.github)?;
    SyncEngine::new(remote, Arc::clone(&store), &config.sync)
        .start()
        .context("spawning sync thread")?;

    tracing::info!(
        "pr-monitor starting for {}/{} on {}",
        config.github.owner,
        config.github.repo,
        config.github.host
    );

    let addr = config.server.listen_addr()?;
    let service = Arc::new(DashboardService::new(
        store,
        config.filters.clone(),
        config.server.refresh_seconds,
    ));

    runtime.block_on(server::serve(addr, server::router(service)))
}
