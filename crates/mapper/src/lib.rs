//! # Mapper
//!
//! Event-to-packet mapping.
//!
//! Responsibilities:
//! - One pure handler per gateway event kind
//! - Field selection and per-kind normalisation (solar day clamp, net import)
//! - The handler table that picks a handler and destination node per event
//!
//! ## Usage Example
//!
//! ```ignore
//! use mapper::{EventRouter, RouteOutcome};
//!
//! let router = EventRouter::from_config(&config);
//! match router.route(&event)? {
//!     RouteOutcome::Relay(routed) => dispatcher.dispatch(routed.node, routed.packet),
//!     RouteOutcome::Consumed(_) | RouteOutcome::Ignored => {}
//! }
//! ```

mod error;
mod handler;
mod handlers;
mod router;

// Re-exports
pub use error::{MapError, Result};
pub use handler::EventHandler;
pub use handlers::{ElectricityHandler, HeatingHandler, SolarHandler, WeatherHandler};
pub use router::{EventRouter, RouteOutcome, RoutedPacket};
