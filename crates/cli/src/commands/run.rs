//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use contracts::RelayConfig;
use dispatcher::Transport;
use ingestion::InputSpec;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let relay = load_config(args)?;
    let input: InputSpec = args
        .input
        .parse()
        .map_err(|e| CliError::input(&args.input, e))?;

    info!(
        input = %input,
        feeds = relay.feeds.len(),
        nodes = ?relay.nodes.configured(),
        solar_policy = relay.solar_policy.as_str(),
        debug = relay.debug,
        no_send = args.no_send,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let pipeline_config = PipelineConfig {
        relay,
        input,
        transport: if args.no_send {
            Transport::Log
        } else {
            Transport::Http
        },
        max_events: (args.max_events != 0).then_some(args.max_events),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        drain_timeout: Duration::from_secs(args.drain_timeout),
    };

    info!("Starting relay...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Relay failed")?;

    info!(
        events = stats.events.total_events,
        packets = stats.packets_dispatched,
        delivery_failures = stats.delivery_failures(),
        events_per_sec = format!("{:.2}", stats.events_per_sec()),
        "Relay completed"
    );
    stats.print_summary();

    Ok(())
}

/// Load, override and validate the relay configuration
fn load_config(args: &RunArgs) -> Result<RelayConfig> {
    let path_str = args.config.display().to_string();
    if !args.config.exists() {
        return Err(CliError::config_not_found(path_str).into());
    }

    let mut relay = config_loader::ConfigLoader::load_from_path(&args.config)
        .map_err(|e| CliError::config(&path_str, e))?;
    apply_overrides(&mut relay, args);
    config_loader::ConfigLoader::validate(&relay).map_err(|e| CliError::config(&path_str, e))?;

    Ok(relay)
}

/// Apply CLI overrides
fn apply_overrides(relay: &mut RelayConfig, args: &RunArgs) {
    if let Some(policy) = args.solar_policy {
        let policy = policy.into();
        if policy != relay.solar_policy {
            info!(solar_policy = ?policy, "Overriding solar policy from CLI");
        }
        relay.solar_policy = policy;
    }
    if args.debug {
        relay.debug = true;
    }
}

/// Peek at the `debug` setting before logging is initialized
pub fn config_debug(path: &Path) -> bool {
    config_loader::ConfigLoader::load_from_path(path)
        .map(|config| config.debug)
        .unwrap_or(false)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
