use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use listing_watcher::config::{AppConfig, CONFIG_PATH};
use listing_watcher::plugins::notifiers::TelegramNotifier;
use listing_watcher::plugins::PluginManager;
use listing_watcher::{DedupStore, RunOutcome, Scheduler};

/// Watch marketplace listings and send a Telegram alert when a price drops into range.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let _guard = init_tracing(&config)?;

    info!("Starting listing watcher...");

    let plugins = PluginManager::new();
    plugins
        .initialize_default_plugins(&config.olx)
        .await
        .context("Failed to initialize listing sources")?;
    info!("Registered listing sources: {:?}", plugins.list_platforms().await);

    let notifier = TelegramNotifier::from_config(&config.telegram)
        .context("Failed to initialize Telegram notifier")?;
    let store = DedupStore::new(config.store.notified_items_file.clone());

    let mut scheduler = Scheduler::new(config, plugins, Arc::new(notifier), store);

    if args.once {
        let report = scheduler.run_once().await?;
        info!(?report, "Single check finished");
        return Ok(());
    }

    let RunOutcome::Stopped = scheduler.run_until(shutdown_signal()).await?;
    info!("Shutting down...");
    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        bail!(
            "Configuration file {} not found. Copy config.example.toml to {} and fill in your Telegram credentials and products.",
            path.display(),
            path.display()
        );
    }

    AppConfig::load(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_tracing(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive("listing_watcher=info".parse()?);

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "listing-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
