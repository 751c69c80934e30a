//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{feed_labels, RelayConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    debug: bool,
    solar_policy: String,
    nodes: Vec<NodeInfo>,
    feed_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    feeds: Vec<FeedInfo>,
}

#[derive(Serialize)]
struct NodeInfo {
    event: String,
    node: String,
}

#[derive(Serialize)]
struct FeedInfo {
    name: String,
    url: String,
    key: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args.feeds);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args.feeds);
    }

    Ok(())
}

fn build_config_info(config: &RelayConfig, show_feeds: bool) -> ConfigInfo {
    let nodes = config
        .nodes
        .configured()
        .into_iter()
        .map(|(kind, node)| NodeInfo {
            event: kind.to_string(),
            node: node.to_string(),
        })
        .collect();

    let feeds = if show_feeds {
        feed_labels(&config.feeds)
            .into_iter()
            .zip(&config.feeds)
            .map(|(name, feed)| FeedInfo {
                name,
                url: feed.url.clone(),
                key: mask_key(&feed.key),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        debug: config.debug,
        solar_policy: config.solar_policy.as_str().to_string(),
        nodes,
        feed_count: config.feeds.len(),
        feeds,
    }
}

/// Keep the last four characters of a write key
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

fn print_config_info(config: &RelayConfig, show_feeds: bool) {
    println!("=== OWL Relay Configuration ===\n");

    println!("Relay");
    println!("   Debug: {}", config.debug);
    println!("   Solar policy: {}", config.solar_policy.as_str());

    let nodes = config.nodes.configured();
    println!("\nNodes ({})", nodes.len());
    for (kind, node) in nodes {
        println!("   {kind} -> {node}");
    }

    println!("\nFeeds ({})", config.feeds.len());
    if show_feeds {
        for (name, feed) in feed_labels(&config.feeds).iter().zip(&config.feeds) {
            println!(
                "   {} {} (key {})",
                name,
                feed.url,
                mask_key(&feed.key)
            );
        }
    }

    println!();
}
