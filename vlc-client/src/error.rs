//! Error types for the VLC HTTP client.

use thiserror::Error;

/// Errors produced by [`VlcClient`](crate::VlcClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Neither the JSON status endpoint nor the XML fallback produced a
    /// usable response. Carries both underlying failure messages.
    #[error("failed to get status from {ip}:{port}: {json_error}; {xml_error}")]
    Connect {
        /// Target host
        ip: String,
        /// Target port
        port: u16,
        /// Failure from the JSON endpoint attempt
        json_error: String,
        /// Failure from the XML fallback attempt
        xml_error: String,
    },

    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// `send_command` was called with an empty command string.
    #[error("missing command")]
    InvalidCommand,

    /// The command endpoint answered with a non-2xx status.
    #[error("command HTTP {status}")]
    Command {
        /// HTTP status code returned by the device
        status: u16,
    },

    /// A status fetch answered with a non-2xx status.
    #[error("HTTP {0}")]
    UnexpectedStatus(u16),

    /// Transport-level failure issuing the request.
    #[error("http error: {0}")]
    Http(reqwest::Error),
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
