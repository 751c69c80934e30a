//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// OWL Relay - forwards OWL Intuition gateway readings to emonCMS feeds
#[derive(Parser, Debug)]
#[command(
    name = "owl-relay",
    author,
    version,
    about = "Relay OWL Intuition energy readings to emonCMS",
    long_about = "Reads decoded OWL Intuition gateway events, maps electricity, solar and \n\
                  heating readings to flat emonCMS packets, and delivers every packet to \n\
                  each configured feed."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "OWL_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "OWL_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config file and `--debug` flag of the selected command
    pub fn config_and_debug_flag(&self) -> (&PathBuf, bool) {
        match &self.command {
            Commands::Run(args) => (&args.config, args.debug),
            Commands::Validate(args) => (&args.config, false),
            Commands::Info(args) => (&args.config, false),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "owl-relay.toml",
        env = "OWL_RELAY_CONFIG"
    )]
    pub config: PathBuf,

    /// Event input: `stdin`, a JSON-lines file, or `udp://host:port`
    #[arg(short, long, default_value = "stdin", env = "OWL_RELAY_INPUT")]
    pub input: String,

    /// Log packets instead of sending them
    #[arg(long, env = "OWL_RELAY_NO_SEND")]
    pub no_send: bool,

    /// Maximum number of events to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "OWL_RELAY_MAX_EVENTS")]
    pub max_events: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "OWL_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Seconds to wait for pending deliveries on shutdown
    #[arg(long, default_value = "5", env = "OWL_RELAY_DRAIN_TIMEOUT")]
    pub drain_timeout: u64,

    /// Channel buffer size for incoming events
    #[arg(long, default_value = "100", env = "OWL_RELAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "OWL_RELAY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Override solar mapping variant from configuration
    #[arg(long, value_enum, env = "OWL_RELAY_SOLAR_POLICY")]
    pub solar_policy: Option<SolarPolicyArg>,

    /// Enable debug logging regardless of configuration
    #[arg(long, env = "OWL_RELAY_DEBUG")]
    pub debug: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "owl-relay.toml", env = "OWL_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "owl-relay.toml", env = "OWL_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show feed endpoints (keys are masked)
    #[arg(long)]
    pub feeds: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Solar mapping variant
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolarPolicyArg {
    /// Generation plus day-generated, negative day clamped to 0
    ClampDay,
    /// Generation plus export power and net import
    ExportImport,
    /// Log solar events, relay nothing
    LogOnly,
}

impl From<SolarPolicyArg> for contracts::SolarPolicy {
    fn from(policy: SolarPolicyArg) -> Self {
        match policy {
            SolarPolicyArg::ClampDay => Self::ClampDay,
            SolarPolicyArg::ExportImport => Self::ExportImport,
            SolarPolicyArg::LogOnly => Self::LogOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["owl-relay", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.input, "stdin");
        assert_eq!(args.max_events, 0);
        assert!(args.solar_policy.is_none());
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "owl-relay",
            "-vv",
            "run",
            "--config",
            "relay.json",
            "--input",
            "udp://0.0.0.0:5100",
            "--solar-policy",
            "export-import",
            "--no-send",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let (config, debug) = cli.config_and_debug_flag();
        assert_eq!(config, &PathBuf::from("relay.json"));
        assert!(debug);

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(
            contracts::SolarPolicy::from(args.solar_policy.unwrap()),
            contracts::SolarPolicy::ExportImport
        );
        assert!(args.no_send);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["owl-relay", "-q", "-v", "validate"]).is_err());
    }
}
