//! RelayedPacket - Dispatcher input
//!
//! Destination node identifier plus the packet to deliver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Packet;

/// Logical telemetry source at the ingestion endpoint
///
/// emonCMS accepts either a numeric node or a node name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Number(i64),
    Name(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

/// Packet addressed to a node, shared by every feed worker
#[derive(Debug, Clone)]
pub struct RelayedPacket {
    /// Dispatch sequence number (monotonically increasing)
    pub seq: u64,

    /// Destination node
    pub node: NodeId,

    /// Packet contents
    pub packet: Arc<Packet>,
}

impl RelayedPacket {
    pub fn new(seq: u64, node: NodeId, packet: Packet) -> Self {
        Self {
            seq,
            node,
            packet: Arc::new(packet),
        }
    }
}
