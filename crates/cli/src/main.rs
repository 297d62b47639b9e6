use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfscout_core::{
    load_config, load_default_config, run_dedupe, run_pipeline, validate_config,
    AutomationSession, Config, HttpSession, PipelineKind, ResultCap,
};

/// Config file used when neither `--config` nor `SHELFSCOUT_CONFIG` is set.
const DEFAULT_CONFIG_PATH: &str = "shelfscout.toml";

#[derive(Debug, Parser)]
#[command(name = "shelfscout", version, about = "Collect product listings from a retail search surface")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "SHELFSCOUT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search every company name and keep the matching brand listings
    Brands {
        /// Maximum rows kept per query: "all" or a number
        #[arg(value_name = "MAX_CARDS", default_value = "all")]
        max_cards: ResultCap,
    },
    /// Search every keyword and keep the returned listings
    Keywords {
        #[arg(value_name = "MAX_CARDS", default_value = "all")]
        max_cards: ResultCap,
    },
    /// Search again for brands that previously found no valid product
    RetryInvalid {
        #[arg(value_name = "MAX_CARDS", default_value = "all")]
        max_cards: ResultCap,
    },
    /// Load the product page of every collected listing
    Details,
    /// Resolve the brand shown on every keyword listing
    BrandNames,
    /// Split the company list into unique and duplicate names
    Dedupe,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let (kind, cap) = match cli.command {
        Command::Dedupe => {
            let report = run_dedupe(&config.dedupe).context("Deduplication failed")?;
            info!(
                "Deduplication finished: {} name(s) read, {} unique, {} duplicated",
                report.total, report.unique, report.duplicates
            );
            return Ok(());
        }
        Command::Brands { max_cards } => (PipelineKind::Brands, max_cards),
        Command::Keywords { max_cards } => (PipelineKind::Keywords, max_cards),
        Command::RetryInvalid { max_cards } => (PipelineKind::RetryInvalid, max_cards),
        Command::Details => (PipelineKind::Details, ResultCap::All),
        Command::BrandNames => (PipelineKind::BrandNames, ResultCap::All),
    };

    info!("Session base URL: {}", config.session.base_url);
    info!("Result cap: {}", cap);

    let session: Arc<dyn AutomationSession> = Arc::new(
        HttpSession::new(&config.session).context("Failed to create automation session")?,
    );

    let summary = run_pipeline(kind, &config, session, cap)
        .await
        .with_context(|| format!("{} pipeline failed", kind))?;

    info!("Done: {}", summary);
    Ok(())
}

/// An explicit path must exist; the default path falls back to built-in
/// defaults when missing.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                load_default_config().context("Failed to load default config")
            }
        }
    }
}
