use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use order_watcher::config::LoggingConfig;
use order_watcher::plugins::{Delivery, build_watcher};
use order_watcher::scheduler::CycleScheduler;
use order_watcher::{AppConfig, AppError};

#[derive(Parser)]
#[command(name = "order-watcher")]
#[command(about = "Watches freelance marketplaces and forwards new orders to Telegram")]
struct Cli {
    /// Extra configuration file layered over config/
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log orders instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    /// With --dry-run, print delivered orders as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every source on the configured interval (default)
    Run,
    /// Run a single cycle and exit
    Once,
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;

    let delivery = if cli.dry_run {
        Delivery::DryRun { json: cli.json }
    } else {
        Delivery::Telegram
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::CheckConfig => check_config(&config, delivery),
        Commands::Once => run_once(&config, delivery).await,
        Commands::Run => run(&config, delivery).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "order-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(guard)
}

fn check_config(config: &AppConfig, delivery: Delivery) -> Result<()> {
    if delivery == Delivery::Telegram {
        config.validate_delivery()?;
    }

    for source in &config.sources {
        info!(
            "{} ({:?}){}: {}",
            source.name,
            source.kind,
            if source.enabled { "" } else { " [disabled]" },
            source.url
        );
    }
    info!("Configuration is valid");
    Ok(())
}

async fn run_once(config: &AppConfig, delivery: Delivery) -> Result<()> {
    let mut watcher = build_watcher(config, delivery)?;
    let summary = watcher.run_cycle().await;

    if summary.failed_deliveries > 0 {
        error!("{} orders could not be delivered", summary.failed_deliveries);
    }
    Ok(())
}

async fn run(config: &AppConfig, delivery: Delivery) -> Result<()> {
    info!("Starting order watcher...");

    let watcher = build_watcher(config, delivery)?;
    let mut scheduler = CycleScheduler::new(watcher, &config.scheduler).await?;
    scheduler.start().await?;

    // First cycle right away instead of waiting a full interval.
    if let Err(e) = scheduler.trigger_now().await {
        error!("Initial cycle failed: {}", e);
    }

    wait_for_shutdown(&scheduler).await?;

    info!("Shutting down...");
    let status = scheduler.status().await;
    info!(
        "{} cycles, {} skipped, {} orders delivered",
        status.stats.completed_cycles, status.stats.skipped_cycles, status.stats.orders_delivered
    );
    {
        let watcher = scheduler.watcher();
        let watcher = watcher.lock().await;
        for (source, delivered) in watcher.delivered_by_source() {
            info!("{}: {} orders delivered", source, delivered);
        }
    }
    scheduler.shutdown().await?;
    Ok(())
}

/// SIGUSR1 runs a cycle now, SIGUSR2 toggles polling. Returns on Ctrl-C.
#[cfg(unix)]
async fn wait_for_shutdown(scheduler: &CycleScheduler) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut trigger = signal(SignalKind::user_defined1())?;
    let mut toggle = signal(SignalKind::user_defined2())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => return Ok(result?),
            _ = trigger.recv() => match scheduler.trigger_now().await {
                Ok(_) => {}
                Err(AppError::CycleInProgress) => info!("A cycle is already running"),
                Err(e) => error!("Manual cycle failed: {}", e),
            },
            _ = toggle.recv() => {
                scheduler.toggle();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_scheduler: &CycleScheduler) -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
