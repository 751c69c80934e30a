//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 路由 -> 分发的完整链路
//! - 本地假 emonCMS 端点（无需真实服务）
//! - feed 之间的故障隔离

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RelayConfig;
    use dispatcher::{DispatcherBuilder, DispatcherConfig, MetricsSnapshot, Transport};
    use ingestion::{IngestionPipeline, MockEventSource};
    use mapper::{EventRouter, RouteOutcome};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    const ELECTRICITY: &str = r#"{
        "channels": {
            "0": [{"current": 120, "units": "w"}, {"day": 1.5, "units": "wh"}],
            "1": [{"current": 80, "units": "w"}, {"day": 0.9, "units": "wh"}],
            "2": [{"current": 0, "units": "w"}, {"day": 0, "units": "wh"}]
        },
        "signal": {"rssi": -40, "lqi": 99},
        "battery": 95
    }"#;

    const SOLAR: &str = r#"{
        "current": [{"generating": 350, "units": "w"}, {"exporting": 0, "units": "w"}],
        "day": [{"generated": -2, "units": "wh"}, {"exported": 0, "units": "wh"}]
    }"#;

    const HEATING: &str = r#"{
        "signal": {"rssi": -58, "lqi": 42},
        "battery": 90,
        "temperature": {"current": 19.5, "required": 21, "state": 0, "flags": 4099}
    }"#;

    const SOLAR_QUERY: &str =
        "json=%7B%22ch2Current%22%3A350%2C%22ch2Day%22%3A0%7D&apikey=abc123&node=11";

    /// Fake emonCMS endpoint: answers 200 and reports each request line
    async fn spawn_endpoint() -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = stream.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&chunk[..n]);
                    }
                    if let Some(line) = String::from_utf8_lossy(&head).lines().next() {
                        let _ = tx.send(line.to_string());
                    }
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                        )
                        .await;
                });
            }
        });

        (format!("http://{addr}/input/post.json"), rx)
    }

    /// Fake endpoint that never answers its first request
    async fn spawn_stalling_endpoint() -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut first = true;
            while let Ok((mut stream, _)) = listener.accept().await {
                let tx = tx.clone();
                let stall = std::mem::replace(&mut first, false);
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = stream.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&chunk[..n]);
                    }
                    if let Some(line) = String::from_utf8_lossy(&head).lines().next() {
                        let _ = tx.send(line.to_string());
                    }
                    if stall {
                        // Keep the connection open without replying
                        std::future::pending::<()>().await;
                    }
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                        )
                        .await;
                });
            }
        });

        (format!("http://{addr}/input/post.json"), rx)
    }

    /// Port with nothing listening on it
    async fn closed_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/input/post.json")
    }

    fn load_config(solar_policy: &str, urls: &[&str]) -> RelayConfig {
        let mut toml = format!(
            "solar_policy = \"{solar_policy}\"\n\n\
             [nodes]\nelectricity = 10\nsolar = 11\nheating = \"boiler\"\n"
        );
        for (idx, url) in urls.iter().enumerate() {
            toml.push_str(&format!(
                "\n[[feeds]]\nname = \"feed{idx}\"\nurl = \"{url}\"\nkey = \"abc123\"\n"
            ));
        }
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    /// MockEventSource -> EventRouter -> Dispatcher (HTTP)
    async fn relay(config: &RelayConfig, source: MockEventSource) -> Vec<(String, MetricsSnapshot)> {
        let router = EventRouter::from_config(config);
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let dispatcher = DispatcherBuilder::new(DispatcherConfig::from_relay_config(
            config,
            Transport::Http,
        ))
        .with_client(client)
        .build()
        .unwrap();

        let mut ingestion = IngestionPipeline::new(16);
        ingestion.register_source(Box::new(source));
        let rx = ingestion.take_receiver().unwrap();
        ingestion.start_all();

        while let Ok(event) = rx.recv().await {
            if let Ok(RouteOutcome::Relay(routed)) = router.route(&event) {
                dispatcher.dispatch(routed.node, routed.packet);
            }
        }

        let feeds = dispatcher.feed_metrics();
        tokio::time::timeout(Duration::from_secs(10), dispatcher.shutdown())
            .await
            .expect("deliveries should drain");

        feeds
            .iter()
            .map(|(name, metrics)| (name.clone(), metrics.snapshot()))
            .collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Every packet reaches every feed
    #[tokio::test]
    async fn test_e2e_packets_reach_every_feed() {
        let (url_a, mut rx_a) = spawn_endpoint().await;
        let (url_b, mut rx_b) = spawn_endpoint().await;
        let config = load_config("clamp_day", &[&url_a, &url_b]);

        let source = MockEventSource::new("gateway")
            .event("solar", SOLAR)
            .event("electricity", ELECTRICITY)
            .event("heating", HEATING);
        let feeds = relay(&config, source).await;

        assert_eq!(feeds.len(), 2);
        for (name, metrics) in &feeds {
            assert_eq!(metrics.delivered_count, 3, "feed {name}");
            assert_eq!(metrics.failure_count, 0, "feed {name}");
        }

        // Requests are outstanding concurrently, so arrival order is not fixed
        for lines in [drain(&mut rx_a), drain(&mut rx_b)] {
            assert_eq!(lines.len(), 3);
            assert!(lines.iter().all(|line| line.starts_with("GET /input/post.json?")));

            let find = |needle: &str| {
                lines
                    .iter()
                    .find(|line| line.contains(needle))
                    .unwrap_or_else(|| panic!("no request with {needle}: {lines:?}"))
            };
            find(SOLAR_QUERY);
            assert!(find("ch1Current%22%3A120").ends_with("&apikey=abc123&node=10 HTTP/1.1"));
            assert!(find("tempCurrent%22%3A19.5").contains("&node=boiler "));
        }
    }

    /// An unreachable feed does not hold back the others
    #[tokio::test]
    async fn test_e2e_unreachable_feed_isolated() {
        let dead = closed_endpoint().await;
        let (url, mut rx) = spawn_endpoint().await;
        let config = load_config("clamp_day", &[&dead, &url]);

        let source = MockEventSource::new("gateway")
            .event("solar", SOLAR)
            .event("solar", SOLAR);
        let feeds = relay(&config, source).await;

        assert_eq!(feeds[0].0, "feed0");
        assert_eq!(feeds[0].1.failure_count, 2);
        assert_eq!(feeds[0].1.delivered_count, 0);
        assert_eq!(feeds[1].1.delivered_count, 2);

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains(SOLAR_QUERY)));
    }

    /// Weather, unknown events and undecodable payloads send nothing
    #[tokio::test]
    async fn test_e2e_nothing_sent_for_unrelayed_events() {
        let (url, mut rx) = spawn_endpoint().await;
        let config = load_config("clamp_day", &[&url]);

        let source = MockEventSource::new("gateway")
            .event("weather", r#"{"temperature": 7, "text": "Cloudy"}"#)
            .event("hot_water", "{}")
            .event("electricity", r#"{"battery": 95}"#)
            .line("not an envelope");
        let feeds = relay(&config, source).await;

        assert_eq!(feeds[0].1, MetricsSnapshot::default());
        assert!(drain(&mut rx).is_empty());
    }

    /// Log-only solar policy relays no solar packet
    #[tokio::test]
    async fn test_e2e_solar_log_only() {
        let (url, mut rx) = spawn_endpoint().await;
        let config = load_config("log_only", &[&url]);

        let source = MockEventSource::new("gateway")
            .event("solar", SOLAR)
            .event("electricity", ELECTRICITY);
        let feeds = relay(&config, source).await;

        assert_eq!(feeds[0].1.delivered_count, 1);
        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("node=10"));
    }

    /// Export/import policy sends generation plus net import
    #[tokio::test]
    async fn test_e2e_solar_export_import() {
        let (url, mut rx) = spawn_endpoint().await;
        let config = load_config("export_import", &[&url]);

        let payload = r#"{
            "current": [{"generating": 350, "units": "w"}, {"exporting": 120, "units": "w"}],
            "day": [{"generated": 900, "units": "wh"}, {"exported": 300, "units": "wh"}]
        }"#;
        relay(&config, MockEventSource::new("gateway").event("solar", payload)).await;

        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("%22ch2Current%22%3A350"), "got: {}", lines[0]);
        assert!(lines[0].contains("%22exportPower%22%3A120"), "got: {}", lines[0]);
        assert!(lines[0].contains("%22netImport%22%3A230"), "got: {}", lines[0]);
        assert!(!lines[0].contains("ch2Day"), "got: {}", lines[0]);
    }

    /// An endpoint that never replies does not hold back later packets
    #[tokio::test]
    async fn test_e2e_stalled_endpoint_keeps_sending() {
        let (url, mut rx) = spawn_stalling_endpoint().await;
        let config = load_config("clamp_day", &[&url]);
        let router = EventRouter::from_config(&config);
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let dispatcher = DispatcherBuilder::new(DispatcherConfig::from_relay_config(
            &config,
            Transport::Http,
        ))
        .with_client(client)
        .build()
        .unwrap();

        for seq in 0..2 {
            let event = contracts::DecodedEvent::new("solar", SOLAR);
            let Ok(RouteOutcome::Relay(routed)) = router.route(&event) else {
                panic!("solar event should be relayed");
            };
            assert_eq!(dispatcher.dispatch(routed.node, routed.packet), seq);
        }

        for _ in 0..2 {
            let line = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("request should arrive")
                .unwrap();
            assert!(line.contains(SOLAR_QUERY), "got: {line}");
        }

        let (_, metrics) = &dispatcher.feed_metrics()[0];
        tokio::time::timeout(Duration::from_secs(5), async {
            while metrics.delivered_count() < 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("second request should be answered");
        assert_eq!(metrics.in_flight(), 1);
        assert_eq!(metrics.queue_len(), 0);
    }
}
