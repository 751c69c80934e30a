//! Electricity 事件处理器
//!
//! Three CT clamp channels plus radio/battery status.

use std::collections::HashMap;

use contracts::{EventKind, Packet, PacketValue};
use serde::Deserialize;
use serde_json::Number;

use crate::error::{MapError, Result};
use crate::handler::EventHandler;
use crate::handlers::common::{decode, Signal};

/// Channel keys in the payload, in packet order (channel 1, 2, 3)
const CHANNELS: [(&str, &str, &str); 3] = [
    ("0", "ch1Current", "ch1Day"),
    ("1", "ch2Current", "ch2Day"),
    ("2", "ch3Current", "ch3Day"),
];

#[derive(Debug, Deserialize)]
struct ElectricityPayload {
    channels: HashMap<String, Vec<ChannelReading>>,
    signal: Signal,
    battery: PacketValue,
}

/// One entry of a channel list: `[{current, units}, {day, units}]`
#[derive(Debug, Deserialize)]
struct ChannelReading {
    #[serde(default)]
    current: Option<Number>,
    #[serde(default)]
    day: Option<Number>,
}

/// Electricity handler
#[derive(Debug, Default)]
pub struct ElectricityHandler;

impl ElectricityHandler {
    pub fn new() -> Self {
        Self
    }
}

impl EventHandler for ElectricityHandler {
    fn kind(&self) -> EventKind {
        EventKind::Electricity
    }

    fn map(&self, payload: &str) -> Result<Option<Packet>> {
        let data: ElectricityPayload = decode(EventKind::Electricity, payload)?;

        let mut currents = Vec::with_capacity(CHANNELS.len());
        let mut days = Vec::with_capacity(CHANNELS.len());
        for (key, current_field, day_field) in CHANNELS {
            let readings = data.channels.get(key).ok_or_else(|| {
                MapError::missing(EventKind::Electricity, format!("channels.{key}"))
            })?;
            let current = readings
                .first()
                .and_then(|reading| reading.current.clone())
                .ok_or_else(|| {
                    MapError::missing(EventKind::Electricity, format!("channels.{key}[0].current"))
                })?;
            currents.push((current_field, current));

            if let Some(day) = readings.get(1).and_then(|reading| reading.day.clone()) {
                days.push((day_field, day));
            }
        }

        let mut builder = Packet::builder();
        for (field, value) in currents.into_iter().chain(days) {
            builder = builder.field(field, value);
        }
        let packet = builder
            .field("signalRssi", data.signal.rssi)
            .field("signalLqi", data.signal.lqi)
            .field("battery", data.battery)
            .build();

        Ok(Some(packet))
    }
}
