//! `validate` command implementation.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use contracts::{feed_labels, EventKind, RelayConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    debug: bool,
    solar_policy: String,
    feed_count: usize,
    nodes: BTreeMap<String, String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    debug: config.debug,
                    solar_policy: config.solar_policy.as_str().to_string(),
                    feed_count: config.feeds.len(),
                    nodes: config
                        .nodes
                        .configured()
                        .into_iter()
                        .map(|(kind, node)| (kind.to_string(), node.to_string()))
                        .collect(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for kind in [EventKind::Electricity, EventKind::Solar, EventKind::Heating] {
        if config.nodes.get(kind).is_none() {
            warnings.push(format!("No node for '{kind}' - these events will be ignored"));
        }
    }

    let mut seen = HashSet::new();
    for (idx, feed) in config.feeds.iter().enumerate() {
        if !seen.insert(feed.url.as_str()) {
            warnings.push(format!(
                "Feed '{}' repeats url {} - packets will be sent there more than once",
                feed.label(idx),
                feed.url
            ));
        }
    }

    let labels = feed_labels(&config.feeds);
    let mut names = HashSet::new();
    for (idx, (label, feed)) in labels.iter().zip(&config.feeds).enumerate() {
        let name = feed.label(idx);
        if !names.insert(name.clone()) {
            warnings.push(format!(
                "Feed name '{name}' is repeated - this feed is reported as '{label}'"
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Debug: {}", summary.debug);
            println!("  Solar policy: {}", summary.solar_policy);
            println!("  Feeds: {}", summary.feed_count);
            for (kind, node) in &summary.nodes {
                println!("  Node {kind}: {node}");
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn validate(content: &str) -> ValidationResult {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        })
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let result = validate(
            r#"
            [nodes]
            electricity = 10

            [[feeds]]
            url = "http://emoncms.example/input/post"
            key = "abc"

            [[feeds]]
            name = "again"
            url = "http://emoncms.example/input/post"
            key = "def"
            "#,
        );

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.feed_count, 2);
        assert_eq!(summary.solar_policy, "clamp_day");
        assert_eq!(summary.nodes.get("electricity").map(String::as_str), Some("10"));

        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("'solar'")));
        assert!(warnings.iter().any(|w| w.contains("'heating'")));
        assert!(warnings.iter().any(|w| w.contains("'again'")));
    }

    #[test]
    fn test_repeated_feed_name_warns() {
        let result = validate(
            r#"
            [nodes]
            electricity = 10
            solar = 11
            heating = 12

            [[feeds]]
            name = "home"
            url = "http://emoncms.example/input/post"
            key = "abc"

            [[feeds]]
            name = "home"
            url = "http://192.168.1.20/emoncms/input/post"
            key = "def"
            "#,
        );

        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'home-1'"), "got: {}", warnings[0]);
    }

    #[test]
    fn test_invalid_config() {
        let result = validate("[nodes]\nsolar = 11\n");
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("feeds"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/owl-relay.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().starts_with("File not found"));
    }
}
