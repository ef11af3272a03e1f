//! Error types for the discovery sweep.

use thiserror::Error;

/// Errors that abort a discovery run.
///
/// Individual probe failures are never surfaced — silence is the expected
/// answer from almost every host on the subnet. The only fatal condition is
/// being unable to enumerate the local interfaces a sweep starts from.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Local network interface enumeration failed
    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
