//! Neighborhood derivation and candidate enumeration.
//!
//! A "neighborhood" is the /24-style prefix (first three octets) of a local
//! interface address; it is the base a sweep enumerates host suffixes under.

use std::collections::BTreeSet;

use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use tracing::debug;

use crate::error::{DiscoveryError, Result};

/// Fallback base used when no non-loopback interface address exists, so a
/// sweep is never empty.
pub(crate) const LOOPBACK_NEIGHBORHOOD: &str = "127.0.0";

/// Host suffixes probed in quick mode: a handful of addresses where routers,
/// servers, and DHCP leases commonly land.
pub(crate) const QUICK_SUFFIXES: [u8; 6] = [1, 2, 10, 50, 100, 254];

/// Derive the /24 neighborhood of a dotted-quad address.
///
/// Returns the first three octets joined by `.`, or `None` for anything that
/// does not split into exactly four parts.
pub fn neighborhood(addr: &str) -> Option<String> {
    let mut parts = addr.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c), Some(_), None) => Some(format!("{a}.{b}.{c}")),
        _ => None,
    }
}

/// Neighborhoods of the host's non-loopback IPv4 interface addresses,
/// deduplicated and in stable order. Falls back to the loopback neighborhood
/// when nothing usable is configured.
pub(crate) fn local_neighborhoods() -> Result<Vec<String>> {
    let interfaces = NetworkInterface::show()
        .map_err(|e| DiscoveryError::Interfaces(format!("{e:?}")))?;

    let addrs = interfaces.into_iter().flat_map(|iface| {
        iface.addr.into_iter().filter_map(|addr| match addr {
            network_interface::Addr::V4(v4) if !v4.ip.is_loopback() => {
                Some(v4.ip.to_string())
            }
            _ => None,
        })
    });

    Ok(derive_bases(addrs))
}

/// Deduplicated neighborhood set for a list of interface addresses, with the
/// loopback fallback applied when the set comes out empty.
pub(crate) fn derive_bases<I>(addrs: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut bases: BTreeSet<String> = addrs
        .into_iter()
        .filter_map(|addr| neighborhood(&addr))
        .collect();

    if bases.is_empty() {
        debug!("no usable interface address, falling back to loopback");
        bases.insert(LOOPBACK_NEIGHBORHOOD.to_string());
    }

    bases.into_iter().collect()
}

/// Materialize the candidate address list for a set of neighborhoods.
///
/// Per neighborhood the suffixes are ascending — the quick set or the full
/// 1..=254 range — so the list is deterministic for a given input.
pub(crate) fn candidates(bases: &[String], quick: bool) -> Vec<String> {
    let mut out = Vec::new();
    for base in bases {
        if quick {
            out.extend(QUICK_SUFFIXES.iter().map(|i| format!("{base}.{i}")));
        } else {
            out.extend((1u8..=254).map(|i| format!("{base}.{i}")));
        }
    }
    out
}
