//! RelayConfig - Config Loader output
//!
//! Static relay configuration: feeds, node identifiers, mapping options.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EventKind, NodeId};

/// Complete relay configuration
///
/// Loaded once at startup and passed by reference into the router and
/// dispatcher; read-only for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Verbose logging of events, packets and outbound requests
    #[serde(default)]
    pub debug: bool,

    /// Solar event mapping variant
    #[serde(default)]
    pub solar_policy: SolarPolicy,

    /// Node identifier per event kind
    #[serde(default)]
    pub nodes: NodeMap,

    /// Destination ingestion endpoints, delivered to in this order
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

/// One ingestion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Endpoint URL (e.g. "http://emoncms.org/input/post.json")
    pub url: String,

    /// API write key
    pub key: String,

    /// Display name for logs/metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FeedConfig {
    /// Feed name, falling back to its position in the feed list
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("feed-{index}"),
        }
    }
}

/// Labels for a feed list, in order
///
/// A repeated name gets its position appended so every feed keeps its own
/// log and metric label.
pub fn feed_labels(feeds: &[FeedConfig]) -> Vec<String> {
    let mut seen = HashSet::new();
    feeds
        .iter()
        .enumerate()
        .map(|(index, feed)| {
            let mut label = feed.label(index);
            while !seen.insert(label.clone()) {
                label = format!("{label}-{index}");
            }
            label
        })
        .collect()
}

/// Node identifiers per relayed event kind
///
/// Weather is never relayed and has no node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity: Option<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar: Option<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating: Option<NodeId>,
}

impl NodeMap {
    /// Node for an event kind, if configured
    pub fn get(&self, kind: EventKind) -> Option<&NodeId> {
        match kind {
            EventKind::Electricity => self.electricity.as_ref(),
            EventKind::Solar => self.solar.as_ref(),
            EventKind::Heating => self.heating.as_ref(),
            EventKind::Weather => None,
        }
    }

    /// Configured (kind, node) pairs
    pub fn configured(&self) -> Vec<(EventKind, &NodeId)> {
        EventKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|node| (kind, node)))
            .collect()
    }
}

/// Solar event mapping variant
///
/// Gateway firmware versions disagree on the solar payload, so the variant
/// is chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarPolicy {
    /// Emit generation and day-generated, negative day values clamped to 0
    #[default]
    ClampDay,
    /// Emit generation plus export power and net import, no day field
    ExportImport,
    /// Log the payload, relay nothing
    LogOnly,
}

impl SolarPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClampDay => "clamp_day",
            Self::ExportImport => "export_import",
            Self::LogOnly => "log_only",
        }
    }
}
