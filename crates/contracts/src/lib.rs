//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `DecodedEvent`: one named event from the gateway decoder, payload is JSON text
//! - `Packet`: ordered flat field set built from exactly one event
//! - `RelayedPacket`: packet + destination node, the unit handed to each feed

mod config;
mod error;
mod event;
mod packet;
mod relay;
mod sink;

pub use config::*;
pub use error::*;
pub use event::*;
pub use packet::*;
pub use relay::*;
pub use sink::*;
