//! recurrente - recurring-transaction execution scheduler.
//!
//! Usage:
//!   recurrente run [--config FILE] [--seed FILE]   Run the scheduler and API server
//!   recurrente validate --config FILE              Validate a configuration file

use clap::{Parser, Subcommand};
use recurrente::api::{self, ApiConfig};
use recurrente::{
    Config, Event, EventBus, EventHandler, HttpPaymentClient, InMemoryStore, Scheduler,
    TransactionStore, load_seed_records,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// recurrente - recurring-transaction execution scheduler
#[derive(Parser)]
#[command(name = "recurrente")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the API server
    Run {
        /// Path to the YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Path to a YAML file of records to preload into the store
        #[arg(long, value_name = "FILE")]
        seed: Option<PathBuf>,

        /// Base URL of the payment service (overrides the config file)
        #[arg(long, value_name = "URL")]
        payment_url: Option<String>,

        /// Scheduler tick interval in seconds (overrides the config file)
        #[arg(long)]
        tick_interval: Option<u64>,

        /// API server port (overrides the config file)
        #[arg(long)]
        api_port: Option<u16>,
    },

    /// Validate a configuration file without running
    Validate {
        /// Path to the YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
}

/// Logging event handler that prints submission lifecycle events.
struct LoggingHandler;

#[async_trait::async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &Event) {
        match event {
            Event::SubmissionStarted {
                code,
                submission_id,
                ..
            } => {
                info!("Submitting '{}' (submission: {})", code, submission_id);
            }
            Event::SubmissionSucceeded {
                code,
                submission_id,
                ..
            } => {
                info!("Submission for '{}' accepted ({})", code, submission_id);
            }
            Event::SubmissionFailed {
                code,
                attempt,
                error,
                ..
            } => {
                warn!(
                    "Submission for '{}' failed (attempt {}): {}",
                    code, attempt, error
                );
            }
            Event::RetryScheduled {
                code,
                attempt,
                next_attempt_at,
                ..
            } => {
                info!(
                    "Retry scheduled for '{}' after attempt {}, next no earlier than {}",
                    code, attempt, next_attempt_at
                );
            }
            Event::TransactionCancelled { code, attempts, .. } => {
                error!("Cancelled '{}' after {} failed attempts", code, attempts);
            }
            Event::TickCompleted { .. } => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            seed,
            payment_url,
            tick_interval,
            api_port,
        } => {
            let mut config = match config {
                Some(path) => Config::from_yaml_file(path)?,
                None => Config::default(),
            };
            if let Some(url) = payment_url {
                config.payment.base_url = url;
            }
            if let Some(secs) = tick_interval {
                config.tick_interval_secs = secs;
            }
            if let Some(port) = api_port {
                config.api.port = port;
            }
            config.validate()?;

            run_service(config, seed).await?;
        }
        Commands::Validate { config } => {
            validate_config(config)?;
        }
    }

    Ok(())
}

/// Run the scheduler and API server until interrupted.
async fn run_service(
    config: Config,
    seed: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::new());

    if let Some(path) = seed {
        let records = load_seed_records(&path)?;
        info!("Seeding {} record(s) from {}", records.len(), path.display());
        for record in records {
            if let Err(e) = store.save(record).await {
                warn!("Skipping seed record: {}", e);
            }
        }
    }

    let client = Arc::new(HttpPaymentClient::with_timeout(
        config.payment.base_url.clone(),
        Duration::from_secs(config.payment.timeout_secs),
    )?);

    // Create event bus with logging handler
    let event_bus = EventBus::new();
    event_bus.register(Arc::new(LoggingHandler)).await;

    let scheduler = Scheduler::with_shared(Arc::clone(&store), client)
        .with_event_bus(event_bus)
        .with_tick_interval(config.tick_interval())
        .with_retry_policy(config.retry.to_policy())
        .with_default_interval(config.default_interval_minutes);

    info!(
        "Starting scheduler (tick interval: {}s, default record interval: {}m)",
        config.tick_interval_secs, config.default_interval_minutes
    );
    let (handle, scheduler_task) = scheduler.start();

    // Start the API server
    let api_config = ApiConfig::new(config.api.host.clone(), config.api.port);
    let api_state = api::create_api_state(handle.clone(), Arc::clone(&store));
    let api_task = api::start_server(api_config, api_state).await?;

    info!("Press Ctrl+C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            handle.shutdown().await?;
        }
        _ = scheduler_task => {
            info!("Scheduler stopped");
        }
    }

    api_task.abort();
    info!("Goodbye!");
    Ok(())
}

/// Validate a configuration file without running.
fn validate_config(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating configuration: {}", path.display());

    match Config::from_yaml_file(&path) {
        Ok(config) => {
            info!(
                "Configuration OK (tick: {}s, retries: {}, payment: {})",
                config.tick_interval_secs, config.retry.max_attempts, config.payment.base_url
            );
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}
