//! EventRouter - handler table keyed by event kind

use std::collections::HashMap;

use contracts::{DecodedEvent, EventKind, NodeId, Packet, RelayConfig};
use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::handler::EventHandler;
use crate::handlers::{ElectricityHandler, HeatingHandler, SolarHandler, WeatherHandler};

/// Packet ready for the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPacket {
    pub kind: EventKind,
    pub node: NodeId,
    pub packet: Packet,
}

/// Result of routing one event
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Packet built, relay it
    Relay(RoutedPacket),
    /// Handler ran but relays nothing (weather, log-only solar)
    Consumed(EventKind),
    /// No handler registered for this event name
    Ignored,
}

struct Route {
    node: Option<NodeId>,
    handler: Box<dyn EventHandler>,
}

/// Handler table
///
/// Built once at startup, then invoked synchronously for every event.
#[derive(Default)]
pub struct EventRouter {
    routes: HashMap<EventKind, Route>,
}

impl EventRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard handler table from configuration
    ///
    /// Relayed kinds without a configured node are left unregistered, so
    /// their events are ignored. Weather is always registered.
    pub fn from_config(config: &RelayConfig) -> Self {
        let mut router = Self::new();
        let nodes = &config.nodes;

        if let Some(node) = nodes.get(EventKind::Electricity) {
            router.register(ElectricityHandler::new(), Some(node.clone()));
        }
        if let Some(node) = nodes.get(EventKind::Solar) {
            router.register(SolarHandler::new(config.solar_policy), Some(node.clone()));
        }
        if let Some(node) = nodes.get(EventKind::Heating) {
            router.register(HeatingHandler::new(), Some(node.clone()));
        }
        router.register(WeatherHandler::new(), None);

        debug!(kinds = ?router.registered(), "Event router built");
        router
    }

    /// Register a handler, replacing any previous handler for its kind
    pub fn register<H: EventHandler + 'static>(&mut self, handler: H, node: Option<NodeId>) {
        self.routes.insert(
            handler.kind(),
            Route {
                node,
                handler: Box::new(handler),
            },
        );
    }

    /// Registered kinds, in canonical order
    pub fn registered(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.routes.contains_key(kind))
            .collect()
    }

    /// Node a kind is relayed to
    pub fn node(&self, kind: EventKind) -> Option<&NodeId> {
        self.routes.get(&kind).and_then(|route| route.node.as_ref())
    }

    /// Map one event
    ///
    /// # Errors
    /// Returns the handler's decode error; only this event is affected.
    #[instrument(name = "event_router_route", skip(self, event), fields(event = %event.name))]
    pub fn route(&self, event: &DecodedEvent) -> Result<RouteOutcome> {
        let Some((kind, route)) = event
            .kind()
            .and_then(|kind| self.routes.get(&kind).map(|route| (kind, route)))
        else {
            trace!(event = %event.name, "No handler, event ignored");
            return Ok(RouteOutcome::Ignored);
        };

        debug!(event = %kind, payload = %event.payload, "Decoded event");

        let outcome = match (route.handler.map(&event.payload)?, &route.node) {
            (Some(packet), Some(node)) => {
                debug!(event = %kind, node = %node, packet = ?packet, "Packet built");
                RouteOutcome::Relay(RoutedPacket {
                    kind,
                    node: node.clone(),
                    packet,
                })
            }
            (Some(_), None) => {
                debug!(event = %kind, "Packet built but no node configured, dropped");
                RouteOutcome::Consumed(kind)
            }
            (None, _) => RouteOutcome::Consumed(kind),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FeedConfig, NodeMap, PacketValue, SolarPolicy};

    use crate::error::MapError;

    fn config(solar_policy: SolarPolicy) -> RelayConfig {
        RelayConfig {
            debug: false,
            solar_policy,
            nodes: NodeMap {
                electricity: Some(NodeId::Number(10)),
                solar: Some(NodeId::Number(11)),
                heating: None,
            },
            feeds: vec![FeedConfig {
                url: "http://localhost/input/post".into(),
                key: "k".into(),
                name: None,
            }],
        }
    }

    const ELECTRICITY: &str = r#"{
        "channels": {
            "0": [{"current": 120}, {"day": 1.5}],
            "1": [{"current": 80}, {"day": 0.9}],
            "2": [{"current": 0}, {"day": 0}]
        },
        "signal": {"rssi": -40, "lqi": 99},
        "battery": 95
    }"#;

    #[test]
    fn test_route_electricity_to_its_node() {
        let router = EventRouter::from_config(&config(SolarPolicy::ClampDay));
        let outcome = router
            .route(&DecodedEvent::new("electricity", ELECTRICITY))
            .unwrap();

        match outcome {
            RouteOutcome::Relay(routed) => {
                assert_eq!(routed.kind, EventKind::Electricity);
                assert_eq!(routed.node, NodeId::Number(10));
                assert_eq!(routed.packet.get("ch1Current"), Some(&PacketValue::from(120)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_solar_uses_configured_policy() {
        let router = EventRouter::from_config(&config(SolarPolicy::LogOnly));
        let outcome = router
            .route(&DecodedEvent::new(
                "solar",
                r#"{"current": [{"generating": 5}], "day": [{"generated": 1}]}"#,
            ))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Consumed(EventKind::Solar));
    }

    #[test]
    fn test_weather_is_consumed() {
        let router = EventRouter::from_config(&config(SolarPolicy::ClampDay));
        let outcome = router
            .route(&DecodedEvent::new("weather", r#"{"temperature": 4}"#))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::Consumed(EventKind::Weather));
    }

    #[test]
    fn test_unknown_and_unconfigured_events_ignored() {
        let router = EventRouter::from_config(&config(SolarPolicy::ClampDay));

        assert_eq!(
            router.route(&DecodedEvent::new("hot_water", "{}")).unwrap(),
            RouteOutcome::Ignored
        );
        // heating has no node configured
        assert_eq!(
            router.route(&DecodedEvent::new("heating", "{}")).unwrap(),
            RouteOutcome::Ignored
        );
        assert_eq!(
            router.registered(),
            vec![EventKind::Electricity, EventKind::Solar, EventKind::Weather]
        );
    }

    #[test]
    fn test_decode_error_surfaces_for_single_event() {
        let router = EventRouter::from_config(&config(SolarPolicy::ClampDay));

        let err = router
            .route(&DecodedEvent::new("electricity", r#"{"battery": 95}"#))
            .unwrap_err();
        assert_eq!(err.event(), EventKind::Electricity);

        // the router is unaffected by the failure
        assert!(matches!(
            router.route(&DecodedEvent::new("electricity", ELECTRICITY)),
            Ok(RouteOutcome::Relay(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let router = EventRouter::from_config(&config(SolarPolicy::ClampDay));
        assert!(matches!(
            router.route(&DecodedEvent::new("solar", "<xml/>")),
            Err(MapError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_handler_without_node_is_consumed() {
        let mut router = EventRouter::new();
        router.register(HeatingHandler::new(), None);

        let payload = r#"{
            "signal": {"rssi": -58, "lqi": 42},
            "battery": 90,
            "temperature": {"current": 19.5, "required": 21, "state": 0, "flags": 0}
        }"#;
        assert_eq!(
            router.route(&DecodedEvent::new("heating", payload)).unwrap(),
            RouteOutcome::Consumed(EventKind::Heating)
        );
        assert_eq!(router.node(EventKind::Heating), None);
    }
}
