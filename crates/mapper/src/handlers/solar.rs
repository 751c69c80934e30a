//! Solar 事件处理器
//!
//! PV generation is reported against channel 2. The payload layout differs
//! between gateway firmware versions, see [`SolarPolicy`].

use contracts::{EventKind, Packet, SolarPolicy};
use serde::Deserialize;
use serde_json::Number;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::handler::EventHandler;
use crate::handlers::common::{decode, is_negative, is_positive, subtract};

#[derive(Debug, Deserialize)]
struct SolarPayload {
    current: Vec<SolarReading>,
    #[serde(default)]
    day: Vec<SolarDay>,
}

/// `current: [{generating, units}, {exporting, units}]`
#[derive(Debug, Deserialize)]
struct SolarReading {
    #[serde(default)]
    generating: Option<Number>,
    #[serde(default)]
    exporting: Option<Number>,
}

/// `day: [{generated, units}, {exported, units}]`
#[derive(Debug, Deserialize)]
struct SolarDay {
    #[serde(default)]
    generated: Option<Number>,
}

/// Solar handler
#[derive(Debug, Default)]
pub struct SolarHandler {
    policy: SolarPolicy,
}

impl SolarHandler {
    pub fn new(policy: SolarPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SolarPolicy {
        self.policy
    }

    fn generating(data: &SolarPayload) -> Result<Number> {
        data.current
            .first()
            .and_then(|reading| reading.generating.clone())
            .ok_or_else(|| MapError::missing(EventKind::Solar, "current[0].generating"))
    }

    /// Generation plus day-generated; negative day values are a known
    /// gateway defect and are reported as 0
    fn clamp_day(data: &SolarPayload) -> Result<Packet> {
        let generating = Self::generating(data)?;
        let generated = data
            .day
            .first()
            .and_then(|day| day.generated.clone())
            .ok_or_else(|| MapError::missing(EventKind::Solar, "day[0].generated"))?;

        let generated = if is_negative(&generated) {
            debug!(generated = %generated, "Negative day generated, clamping to 0");
            Number::from(0)
        } else {
            generated
        };

        Ok(Packet::builder()
            .field("ch2Current", generating)
            .field("ch2Day", generated)
            .build())
    }

    /// Generation plus export power; net import when exporting
    fn export_import(data: &SolarPayload) -> Result<Packet> {
        let generating = Self::generating(data)?;
        let exporting = data
            .current
            .get(1)
            .and_then(|reading| reading.exporting.clone());

        let net_import = match &exporting {
            Some(exporting) if is_positive(exporting) => Some(
                subtract(&generating, exporting).ok_or_else(|| MapError::Decode {
                    event: EventKind::Solar,
                    message: format!("cannot subtract {exporting} from {generating}"),
                })?,
            ),
            _ => None,
        };

        Ok(Packet::builder()
            .field("ch2Current", generating)
            .field_opt("exportPower", exporting)
            .field_opt("netImport", net_import)
            .build())
    }
}

impl EventHandler for SolarHandler {
    fn kind(&self) -> EventKind {
        EventKind::Solar
    }

    fn map(&self, payload: &str) -> Result<Option<Packet>> {
        let packet = match self.policy {
            SolarPolicy::ClampDay => Self::clamp_day(&decode(EventKind::Solar, payload)?)?,
            SolarPolicy::ExportImport => {
                Self::export_import(&decode(EventKind::Solar, payload)?)?
            }
            SolarPolicy::LogOnly => {
                let raw: serde_json::Value = decode(EventKind::Solar, payload)?;
                debug!(solar = %raw, "Solar event (log only)");
                return Ok(None);
            }
        };
        Ok(Some(packet))
    }
}
