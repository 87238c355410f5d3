// crates/tessera-cli/src/main.rs
//
// CLI entrypoint for Tessera.
//
// Provides subcommands for batch uploads, the dataset lifecycle, version
// history, and fetching stored content. The dataset registry is kept in a
// JSON state file between invocations.

mod commands;
mod config;
mod context;
mod output;
mod state;

use clap::{Parser, Subcommand};
use commands::dataset::DatasetCmd;
use commands::fetch::FetchCmd;
use commands::upload::UploadCmd;
use config::{Backend, TesseraConfig};
use context::AppContext;
use output::OutputFormat;

/// Tessera: versioned datasets on content-addressed storage.
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    version = "0.1.0",
    about = "Batch uploads and versioned datasets on IPFS or a local content-addressed store"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.tessera/config.toml")]
    config: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Override the configured storage backend.
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// Override the configured upload concurrency.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Override the configured registry state file.
    #[arg(long, global = true)]
    state_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload files without registering a dataset.
    Upload(UploadCmd),

    /// Dataset management: create, get, list, update, versions, rollback.
    #[command(subcommand)]
    Dataset(DatasetCmd),

    /// Fetch stored content by content id.
    Fetch(FetchCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logging is set up afterwards so the configured level
    // applies; the outcome is reported once the subscriber exists.
    let loaded = TesseraConfig::load(&cli.config);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => TesseraConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match loaded {
        Ok(_) => tracing::debug!("Loaded configuration from {}", cli.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            cli.config,
            e
        ),
    }

    // CLI flags override the config file values.
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(state_file) = &cli.state_file {
        config.state_file = state_file.clone();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };
    tracing::debug!(
        "Backend {:?}, state file {}",
        config.backend,
        config.state_path().display()
    );
    let ctx = AppContext::open(config, format).await?;

    match &cli.command {
        Commands::Upload(cmd) => commands::upload::run(&ctx, cmd).await?,
        Commands::Dataset(cmd) => commands::dataset::run(&ctx, cmd).await?,
        Commands::Fetch(cmd) => commands::fetch::run(&ctx, cmd).await?,
    }

    Ok(())
}
