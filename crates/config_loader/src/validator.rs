//! 配置校验模块
//!
//! 校验规则：
//! - 至少配置一个 feed
//! - feed url 为带 host 的绝对 http/https 地址
//! - feed key 非空
//! - feed name 非空 (重复名称允许，由 feed_labels 区分)
//! - 至少配置一个 node，字符串 node 非空

use contracts::{ContractError, NodeId, RelayConfig};
use url::Url;

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_feeds_present(config)?;
    validate_feed_urls(config)?;
    validate_feed_keys(config)?;
    validate_feed_names(config)?;
    validate_nodes(config)?;
    Ok(())
}

fn validate_feeds_present(config: &RelayConfig) -> Result<(), ContractError> {
    if config.feeds.is_empty() {
        return Err(ContractError::config_validation(
            "feeds",
            "at least one feed must be configured",
        ));
    }
    Ok(())
}

/// 校验 feed url 可解析
fn validate_feed_urls(config: &RelayConfig) -> Result<(), ContractError> {
    for (idx, feed) in config.feeds.iter().enumerate() {
        let field = format!("feeds[{}].url", idx);
        let url = Url::parse(&feed.url).map_err(|e| {
            ContractError::config_validation(&field, format!("invalid url '{}': {e}", feed.url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContractError::config_validation(
                field,
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ContractError::config_validation(field, "url has no host"));
        }
    }
    Ok(())
}

fn validate_feed_keys(config: &RelayConfig) -> Result<(), ContractError> {
    for (idx, feed) in config.feeds.iter().enumerate() {
        if feed.key.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("feeds[{}].key", idx),
                "feed key cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验 feed 名称非空
fn validate_feed_names(config: &RelayConfig) -> Result<(), ContractError> {
    for (idx, feed) in config.feeds.iter().enumerate() {
        if feed.label(idx).trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("feeds[{}].name", idx),
                "feed name cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验 node 配置
fn validate_nodes(config: &RelayConfig) -> Result<(), ContractError> {
    let configured = config.nodes.configured();
    if configured.is_empty() {
        return Err(ContractError::config_validation(
            "nodes",
            "no node configured - nothing would be relayed",
        ));
    }

    for (kind, node) in configured {
        if let NodeId::Name(name) = node {
            if name.trim().is_empty() {
                return Err(ContractError::config_validation(
                    format!("nodes.{}", kind),
                    "node name cannot be empty",
                ));
            }
        }
    }
    Ok(())
}
