//! # OWL Relay CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - Relay 编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{config_debug, run_info, run_relay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "OWL relay starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_relay(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let config = logging_config(cli, || {
        let (path, _) = cli.config_and_debug_flag();
        config_debug(path)
    });
    observability::init_with_config(config)
}

/// `-q` pins the level to errors; `-v` raises it; otherwise the `debug`
/// setting picks the default and `RUST_LOG` may override it.
fn logging_config(cli: &Cli, config_debug: impl FnOnce() -> bool) -> ObservabilityConfig {
    let mut config = ObservabilityConfig {
        log_format: cli.log_format.into(),
        ..ObservabilityConfig::default()
    };

    if cli.quiet {
        config.default_log_level = "error".to_string();
        config.env_override = false;
        return config;
    }

    config.default_log_level = match cli.verbose {
        0 => {
            let (_, debug_flag) = cli.config_and_debug_flag();
            observability::default_log_level(debug_flag || config_debug()).to_string()
        }
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    config
}
