mod config;
mod model;
mod protocol;
mod seed;
mod server;
mod service;
mod store;

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, LogConfig, Overrides};
use server::Server;
use service::Service;
use store::Store;

/// In-memory users and scores service
#[derive(Debug, Parser)]
#[command(name = "scoredb", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the snapshot and serve requests (default)
    Serve,
    /// Write a demo snapshot with three users and five scores each
    Seed {
        /// Where to write the snapshot
        #[arg(long, default_value = "scoredb.db.json")]
        out: String,
    },
}

#[derive(Debug, Clone, Default, Args)]
struct ServeArgs {
    /// TOML configuration file
    #[arg(long, short, global = true)]
    config: Option<String>,

    /// Snapshot to load at startup
    #[arg(long, global = true, env = "DB_FILE")]
    db_file: Option<String>,

    /// Address to listen on
    #[arg(long, global = true, env = "SCOREDB_ADDR")]
    listen: Option<String>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
}

impl ServeArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            server_addr: self.listen.clone(),
            db_file: self.db_file.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = Config::resolve(args.config.as_deref(), args.overrides())?;
    init_logging(&config.log)?;

    info!("Starting ScoreDB - in-memory users and scores service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store = Store::load(&config.db_file)
        .with_context(|| format!("failed to load snapshot '{}'", config.db_file))?;
    info!(
        "Loaded {} users and {} scores from {}",
        store.users.len(),
        store.scores.len(),
        config.db_file
    );

    let service = Arc::new(Service::new(store));
    let server = Arc::new(Server::bind(&config.server_addr, service).await?);
    info!("Server listening on: {}", server.local_addr());

    tokio::select! {
        _ = server.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Shutting down, in-memory changes are discarded");
        }
    }
    Ok(())
}

fn write_seed(out: &str) -> anyhow::Result<()> {
    let store = seed::generate();
    store.save(out)?;
    println!(
        "Wrote {} users and {} scores to {}",
        store.users.len(),
        store.scores.len(),
        out
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Seed { out }) => write_seed(&out),
        Some(Command::Serve) | None => serve(cli.serve).await,
    }
}
