//! The bounded worker pool that drives a sweep.
//!
//! Workers share an atomic claim counter over a pre-built candidate list, so
//! no candidate is probed twice and the pool drains once the counter passes
//! the end. A separate flag implements stop-on-first: it gates claiming, not
//! completion, so probes already in flight are allowed to finish.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use vlc_client::VlcClient;

use crate::subnet;
use crate::{DeviceRecord, ScanConfig};

/// Sweep the given neighborhood bases and collect every device that answers.
pub(crate) async fn sweep(bases: &[String], config: &ScanConfig) -> Vec<DeviceRecord> {
    let candidates = Arc::new(subnet::candidates(bases, config.quick));
    if candidates.is_empty() {
        return Vec::new();
    }

    let workers = config.concurrency.clamp(1, candidates.len());
    info!(
        candidates = candidates.len(),
        workers,
        quick = config.quick,
        "starting subnet sweep"
    );

    let client = VlcClient::new();
    let config = Arc::new(config.clone());
    let next = Arc::new(AtomicUsize::new(0));
    let halt = Arc::new(AtomicBool::new(false));
    let (found_tx, mut found_rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let candidates = Arc::clone(&candidates);
        let config = Arc::clone(&config);
        let next = Arc::clone(&next);
        let halt = Arc::clone(&halt);
        let client = client.clone();
        let found_tx = found_tx.clone();

        handles.push(tokio::spawn(async move {
            loop {
                if config.stop_on_first && halt.load(Ordering::SeqCst) {
                    break;
                }
                let idx = next.fetch_add(1, Ordering::SeqCst);
                let Some(ip) = candidates.get(idx) else {
                    break;
                };
                if let Some(record) = check_host(&client, ip, &config, &halt).await {
                    halt.store(true, Ordering::SeqCst);
                    let _ = found_tx.send(record);
                }
            }
        }));
    }
    drop(found_tx);

    for handle in handles {
        let _ = handle.await;
    }

    let mut results = Vec::new();
    while let Some(record) = found_rx.recv().await {
        results.push(record);
    }
    info!(found = results.len(), "subnet sweep finished");
    results
}

/// Probe one candidate address across the configured ports, in order.
///
/// The first port that yields a status wins; a host contributes at most one
/// record. Failures are swallowed — an unanswered probe is the normal case
/// for almost every address on the subnet.
async fn check_host(
    client: &VlcClient,
    ip: &str,
    config: &ScanConfig,
    halt: &AtomicBool,
) -> Option<DeviceRecord> {
    for &port in &config.ports {
        if config.stop_on_first && halt.load(Ordering::SeqCst) {
            return None;
        }
        match client
            .get_status(ip, port, config.auth.as_ref(), Some(config.timeout))
            .await
        {
            Ok(status) => {
                debug!(%ip, port, "device found");
                return Some(DeviceRecord {
                    ip: ip.to_string(),
                    port,
                    status,
                });
            }
            Err(err) => trace!(%ip, port, %err, "probe miss"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn mock_target(server: &mockito::ServerGuard) -> u16 {
        server
            .host_with_port()
            .split_once(':')
            .unwrap()
            .1
            .parse()
            .unwrap()
    }

    fn quick_config(port: u16) -> ScanConfig {
        ScanConfig {
            ports: vec![port],
            timeout: Duration::from_millis(300),
            quick: true,
            ..ScanConfig::default()
        }
    }

    #[tokio::test]
    async fn sweep_finds_a_device_on_the_loopback_neighborhood() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/requests/status.json")
            .with_status(200)
            .with_body(r#"{"state":"playing","volume":100}"#)
            .create_async()
            .await;

        // mockito binds 127.0.0.1, which is suffix 1 of the quick set
        let config = quick_config(mock_target(&server));
        let devices = sweep(&["127.0.0".to_string()], &config).await;

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip, "127.0.0.1");
        assert_eq!(devices[0].port, config.ports[0]);
        assert_eq!(devices[0].status.state.as_deref(), Some("playing"));
    }

    #[tokio::test]
    async fn sweep_returns_empty_when_nothing_answers() {
        // Port 1 on loopback has no listener; every probe fails silently.
        let config = quick_config(1);
        let devices = sweep(&["127.0.0".to_string()], &config).await;

        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn stop_on_first_claims_no_further_candidates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/requests/status.json")
            .with_status(200)
            .with_body(r#"{"state":"stopped"}"#)
            .expect(1)
            .create_async()
            .await;

        // A single worker finds 127.0.0.1 on its first claim and must not
        // touch the rest of the quick set.
        let config = ScanConfig {
            concurrency: 1,
            stop_on_first: true,
            ..quick_config(mock_target(&server))
        };
        let devices = sweep(&["127.0.0".to_string()], &config).await;

        assert_eq!(devices.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn ports_are_tried_in_configured_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/requests/status.json")
            .with_status(200)
            .with_body(r#"{"state":"paused"}"#)
            .create_async()
            .await;

        // Port 1 (dead) first, the live port second: the record must carry
        // the second port, and exactly one record per host.
        let live = mock_target(&server);
        let config = ScanConfig {
            ports: vec![1, live],
            timeout: Duration::from_millis(300),
            quick: true,
            ..ScanConfig::default()
        };
        let devices = sweep(&["127.0.0".to_string()], &config).await;

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].port, live);
    }
}
