//! 事件处理器 trait

use contracts::{EventKind, Packet};

use crate::error::Result;

/// Event handler trait
///
/// One implementation per event kind. Handlers are pure: the packet depends
/// only on the payload passed in, nothing is carried between calls.
pub trait EventHandler: Send + Sync {
    /// Event kind handled
    fn kind(&self) -> EventKind;

    /// Convert one decoded payload into a packet
    ///
    /// `Ok(None)` means the event is consumed without relaying anything.
    fn map(&self, payload: &str) -> Result<Option<Packet>>;
}
