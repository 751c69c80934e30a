//! FeedSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivery transports.

use crate::{ContractError, RelayedPacket};

/// Delivery transport trait
///
/// One instance per configured feed, shared by every request the feed's
/// worker has in flight.
#[trait_variant::make(FeedSink: Send)]
pub trait LocalFeedSink {
    /// Feed name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one packet
    ///
    /// Several deliveries to the same feed may be outstanding at once.
    ///
    /// # Errors
    /// Returns a delivery error when no response could be obtained.
    /// The response status is not interpreted.
    async fn deliver(&self, relayed: &RelayedPacket) -> Result<(), ContractError>;

    /// Release transport resources
    async fn close(&self) -> Result<(), ContractError>;
}
