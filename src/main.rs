//! Items API service.
//!
//! ```text
//!   main ──▶ config (file + CLI) ──▶ logging
//!     │
//!     ├──▶ SignalWatcher (SIGINT/SIGTERM)
//!     ├──▶ HttpListener(HandlerSet)  ── own task: accept loop
//!     └──▶ Coordinator.run ──▶ ShutdownReport ──▶ exit code
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use items_api::config::{parse_config, validate_config, ConfigError, ServiceConfig};
use items_api::http::{HandlerSet, ItemCatalog};
use items_api::lifecycle::{Coordinator, GracePeriod, SignalWatcher};
use items_api::net::HttpListener;
use items_api::observability::logging::{self, PhaseGuard};

#[derive(Parser)]
#[command(name = "items-api")]
#[command(about = "Items API with graceful shutdown", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override timeouts.grace_period_ms.
    #[arg(long)]
    grace_period_ms: Option<u64>,
}

fn load(cli: &Cli) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => parse_config(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(grace_period_ms) = cli.grace_period_ms {
        config.timeouts.grace_period_ms = grace_period_ms;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: configuration: {e}");
            return ExitCode::from(2);
        }
    };

    logging::init(&config.observability);
    let _main = PhaseGuard::enter("main");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        read_ms = config.timeouts.read_ms,
        write_ms = config.timeouts.write_ms,
        grace_period_ms = config.timeouts.grace_period_ms,
        "Configuration loaded"
    );

    let signals = match SignalWatcher::from_os() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register signal handlers");
            return ExitCode::FAILURE;
        }
    };

    let handlers = HandlerSet::with_default_routes(ItemCatalog::default());
    let listener = Arc::new(HttpListener::new(
        &config.listener,
        handlers,
        &config.timeouts,
    ));

    let report = Coordinator::new(listener, GracePeriod::new(config.timeouts.grace_period()))
        .with_force_close_timeout(config.timeouts.force_close_timeout())
        .run(signals)
        .await;

    if report.outcome.is_fatal() {
        tracing::error!(outcome = %report.outcome, "Service stopped");
    } else {
        tracing::info!(outcome = %report.outcome, "Service stopped");
    }

    ExitCode::from(report.exit_code())
}
