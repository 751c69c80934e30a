//! Heating 事件处理器

use contracts::{EventKind, Packet, PacketValue};
use serde::Deserialize;

use crate::error::Result;
use crate::handler::EventHandler;
use crate::handlers::common::{decode, Signal};

#[derive(Debug, Deserialize)]
struct HeatingPayload {
    signal: Signal,
    battery: PacketValue,
    temperature: Temperature,
}

#[derive(Debug, Deserialize)]
struct Temperature {
    current: PacketValue,
    required: PacketValue,
    state: PacketValue,
    flags: PacketValue,
}

/// Heating controller handler
#[derive(Debug, Default)]
pub struct HeatingHandler;

impl HeatingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl EventHandler for HeatingHandler {
    fn kind(&self) -> EventKind {
        EventKind::Heating
    }

    fn map(&self, payload: &str) -> Result<Option<Packet>> {
        let data: HeatingPayload = decode(EventKind::Heating, payload)?;

        let packet = Packet::builder()
            .field("signalRssi", data.signal.rssi)
            .field("signalLqi", data.signal.lqi)
            .field("battery", data.battery)
            .field("tempCurrent", data.temperature.current)
            .field("tempRequired", data.temperature.required)
            .field("state", data.temperature.state)
            .field("flags", data.temperature.flags)
            .build();

        Ok(Some(packet))
    }
}
