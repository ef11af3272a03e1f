//! Subnet discovery of VLC HTTP control interfaces.
//!
//! Rather than relying on multicast announcements, this crate sweeps the
//! /24 neighborhoods of the host's own interface addresses, probing each
//! candidate address against a priority list of likely control ports. A
//! bounded worker pool keeps the 254-host fan-out from opening an unbounded
//! number of sockets at once.
//!
//! Discovery is best-effort and time-boxed by the per-probe deadline; a host
//! that never answers is simply absent from the result list.
//!
//! # Quick Start
//!
//! ```no_run
//! use vlc_discovery::{discover, ScanConfig};
//!
//! # async fn run() -> Result<(), vlc_discovery::DiscoveryError> {
//! let devices = discover(&ScanConfig::default()).await?;
//! for device in &devices {
//!     println!("found player at {}:{}", device.ip, device.port);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod scanner;
mod subnet;

pub use error::{DiscoveryError, Result};
pub use subnet::neighborhood;
pub use vlc_client::{Auth, StatusSnapshot};

use std::time::Duration;

use serde::Serialize;

/// Configuration for one discovery run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Control ports tried in order per host. This is a priority list of
    /// likely ports, not an enumeration — the first one that answers wins.
    /// Default: [8080, 8081, 8000, 3000, 9090]
    pub ports: Vec<u16>,

    /// Credentials passed through to every probe.
    /// Default: none
    pub auth: Option<Auth>,

    /// Per-probe deadline.
    /// Default: 1500 ms
    pub timeout: Duration,

    /// Worker pool size, clamped to `[1, candidate count]`.
    /// Default: 60
    pub concurrency: usize,

    /// Probe only the fixed suffix set {1, 2, 10, 50, 100, 254} per
    /// neighborhood instead of the full 1..=254 range.
    /// Default: false
    pub quick: bool,

    /// Stop claiming new candidates once a device is found. Probes already
    /// in flight finish out — each worker completes at most the candidate it
    /// holds when the first success registers — so the result list may still
    /// carry more than one record.
    /// Default: false
    pub stop_on_first: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: vec![8080, 8081, 8000, 3000, 9090],
            auth: None,
            timeout: vlc_client::DEFAULT_TIMEOUT,
            concurrency: 60,
            quick: false,
            stop_on_first: false,
        }
    }
}

/// A device located by a sweep: where it answered and what it said.
///
/// Records are immutable once created; one candidate contributes at most one
/// record, on the first port that answered.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    /// Dotted-quad address the device answered on
    pub ip: String,
    /// Port the device answered on
    pub port: u16,
    /// Status snapshot returned by the successful probe
    pub status: StatusSnapshot,
}

/// Discover players reachable from this host's local neighborhoods.
///
/// Derives the scan bases from the host's non-loopback IPv4 interface
/// addresses (falling back to the loopback /24 when none exist) and sweeps
/// them. Per-candidate failures are swallowed; the only error is failing to
/// enumerate the local interfaces at all.
pub async fn discover(config: &ScanConfig) -> Result<Vec<DeviceRecord>> {
    let bases = subnet::local_neighborhoods()?;
    Ok(discover_subnets(&bases, config).await)
}

/// Sweep explicit neighborhood bases (first three octets, e.g. `"10.0.0"`).
///
/// Useful when the caller already knows the subnet; `discover` delegates
/// here after deriving bases from the local interfaces.
pub async fn discover_subnets(bases: &[String], config: &ScanConfig) -> Vec<DeviceRecord> {
    scanner::sweep(bases, config).await
}
