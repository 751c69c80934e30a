//! Weather 事件处理器
//!
//! Internet weather data relayed by the gateway. Available in more detail
//! from the source itself, so it is logged and never relayed.

use contracts::{EventKind, Packet};
use tracing::debug;

use crate::error::Result;
use crate::handler::EventHandler;
use crate::handlers::common::decode;

#[derive(Debug, Default)]
pub struct WeatherHandler;

impl WeatherHandler {
    pub fn new() -> Self {
        Self
    }
}

impl EventHandler for WeatherHandler {
    fn kind(&self) -> EventKind {
        EventKind::Weather
    }

    fn map(&self, payload: &str) -> Result<Option<Packet>> {
        let raw: serde_json::Value = decode(EventKind::Weather, payload)?;
        debug!(weather = %raw, "Weather event");
        Ok(None)
    }
}
