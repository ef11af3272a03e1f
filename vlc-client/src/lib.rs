//! Async client for the VLC HTTP control interface.
//!
//! VLC exposes a small request/response control surface over HTTP:
//! `/requests/status.json` for structured playback state and
//! `/requests/status.xml` for legacy status and the command channel
//! (`?command=...`). This crate wraps both behind a stateless client with
//! per-request deadlines and HTTP Basic auth pass-through.
//!
//! # Quick Start
//!
//! ```no_run
//! use vlc_client::VlcClient;
//!
//! # async fn run() -> Result<(), vlc_client::ClientError> {
//! let client = VlcClient::new();
//! let status = client.get_status("192.168.1.50", 8080, None, None).await?;
//! println!("state: {:?}", status.state);
//! # Ok(())
//! # }
//! ```
//!
//! The client performs no retries; callers own their own fallback policy
//! (the scanner tries multiple ports, a status poller just waits for its
//! next tick).

mod error;
mod status;

pub use error::{ClientError, Result};
pub use status::{NowPlaying, StatusSnapshot};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default VLC HTTP interface port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Credential pair passed through to the player's HTTP interface.
///
/// VLC ignores the username and only checks the password, but the header is
/// built from both; a missing password is sent as the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Result of a dispatched command.
///
/// The XML command channel has no structured acknowledgement format, so
/// success means "the device answered 2xx", and `body` is whatever it sent
/// back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub ok: bool,
    pub body: String,
}

/// Stateless request/response client against VLC HTTP interfaces.
///
/// One instance can serve any number of hosts; the target is supplied per
/// call. Cloning is cheap (shares the underlying connection pool).
#[derive(Debug, Clone, Default)]
pub struct VlcClient {
    http: reqwest::Client,
}

impl VlcClient {
    /// Create a new client with a default connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a status snapshot from `ip:port`.
    ///
    /// Tries the structured JSON endpoint first. On any failure there
    /// (unreachable, non-2xx, body not JSON, deadline exceeded) it falls
    /// back to the legacy XML endpoint and returns its body verbatim as a
    /// fallback snapshot. Only when both attempts fail does this error, with
    /// [`ClientError::Connect`] carrying both failure messages.
    ///
    /// `timeout` bounds each individual request; `None` uses
    /// [`DEFAULT_TIMEOUT`].
    pub async fn get_status(
        &self,
        ip: &str,
        port: u16,
        auth: Option<&Auth>,
        timeout: Option<Duration>,
    ) -> Result<StatusSnapshot> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let base = format!("http://{ip}:{port}");

        let json_error = match self
            .fetch_text(&format!("{base}/requests/status.json"), auth, timeout)
            .await
        {
            Ok(body) => match serde_json::from_str::<Value>(&body) {
                Ok(value) => {
                    debug!(%ip, port, "status.json ok");
                    return Ok(StatusSnapshot::from_json(value));
                }
                Err(_) => "not JSON".to_string(),
            },
            Err(err) => err.to_string(),
        };

        // The legacy endpoint is probed without credentials.
        match self
            .fetch_text(&format!("{base}/requests/status.xml"), None, timeout)
            .await
        {
            Ok(body) => {
                debug!(%ip, port, "status.xml fallback ok");
                Ok(StatusSnapshot::from_raw_text(body))
            }
            Err(err) => Err(ClientError::Connect {
                ip: ip.to_string(),
                port,
                json_error,
                xml_error: err.to_string(),
            }),
        }
    }

    /// Dispatch a command to `ip:port` over the XML command channel.
    ///
    /// Every entry of `params` is attached as a string-valued query
    /// parameter alongside `command`. Fails with
    /// [`ClientError::InvalidCommand`] before any network I/O when `command`
    /// is empty, and with [`ClientError::Command`] when the device answers
    /// non-2xx.
    pub async fn send_command(
        &self,
        ip: &str,
        port: u16,
        command: &str,
        params: &serde_json::Map<String, Value>,
        auth: Option<&Auth>,
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        if command.is_empty() {
            return Err(ClientError::InvalidCommand);
        }
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut query: Vec<(String, String)> =
            vec![("command".to_string(), command.to_string())];
        for (key, value) in params {
            query.push((key.clone(), coerce_to_string(value)));
        }

        let url = format!("http://{ip}:{port}/requests/status.xml");
        let mut request = self.http.get(&url).query(&query).timeout(timeout);
        if let Some(auth) = auth_header(auth) {
            request = request.basic_auth(auth.0, Some(auth.1));
        }

        debug!(%ip, port, command, "sending command");
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Command {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(map_transport)?;
        Ok(CommandResult { ok: true, body })
    }

    /// GET `url` and return its body, failing on non-2xx.
    async fn fetch_text(
        &self,
        url: &str,
        auth: Option<&Auth>,
        timeout: Duration,
    ) -> Result<String> {
        let mut request = self.http.get(url).timeout(timeout);
        if let Some((user, pass)) = auth_header(auth) {
            request = request.basic_auth(user, Some(pass));
        }
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status.as_u16()));
        }
        response.text().await.map_err(map_transport)
    }
}

/// Basic-auth pair to attach, if the caller supplied a usable username.
fn auth_header(auth: Option<&Auth>) -> Option<(&str, &str)> {
    let auth = auth?;
    if auth.username.is_empty() {
        return None;
    }
    Some((
        auth.username.as_str(),
        auth.password.as_deref().unwrap_or(""),
    ))
}

/// String form of a JSON value for query parameters. Strings are used
/// as-is, everything else takes its JSON rendering.
fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_transport(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(err)
    }
}
