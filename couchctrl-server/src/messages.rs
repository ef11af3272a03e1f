//! WebSocket control-protocol message types.
//!
//! Every frame on the persistent connection is one JSON document. Inbound
//! frames are discriminated by `action`, outbound frames by `type`. A frame
//! that fails to parse gets a single error reply and is otherwise ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vlc_client::{Auth, CommandResult, StatusSnapshot};

pub const DEFAULT_TARGET_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;

fn default_target_port() -> u16 {
    DEFAULT_TARGET_PORT
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Inbound control message, one per frame.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Start (or replace) the status polling loop against a target.
    Subscribe {
        ip: String,
        #[serde(default = "default_target_port")]
        port: u16,
        /// Poll interval in milliseconds
        #[serde(default = "default_poll_interval_ms")]
        interval: u64,
        auth: Option<Auth>,
    },
    /// Stop the polling loop, if any.
    Unsubscribe,
    /// Forward a command to a player. Omitting `ip` targets the session's
    /// current subscription.
    Command {
        ip: Option<String>,
        port: Option<u16>,
        command: String,
        #[serde(default)]
        params: Map<String, Value>,
        auth: Option<Auth>,
    },
}

/// Outbound frame pushed to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Subscription acknowledged; polling has started against this target
    Subscribed { ip: String, port: u16 },
    /// Unsubscribe acknowledged (also sent when there was nothing to stop)
    Unsubscribed,
    /// One status snapshot from the polling loop
    Status { status: StatusSnapshot },
    /// Result of a forwarded command
    CommandResult { result: CommandResult },
    /// Any failure: a failed poll tick, a failed command, a malformed frame.
    /// Never terminates the connection.
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_subscribe_with_defaults() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"action":"subscribe","ip":"10.0.0.5"}"#).unwrap();

        match msg {
            ClientMessage::Subscribe {
                ip,
                port,
                interval,
                auth,
            } => {
                assert_eq!(ip, "10.0.0.5");
                assert_eq!(port, DEFAULT_TARGET_PORT);
                assert_eq!(interval, DEFAULT_POLL_INTERVAL_MS);
                assert!(auth.is_none());
            }
            other => panic!("expected Subscribe, got {other:?}"),
        }
    }

    #[test]
    fn parses_command_without_explicit_target() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"action":"command","command":"pl_pause","params":{"id":3}}"#,
        )
        .unwrap();

        match msg {
            ClientMessage::Command {
                ip,
                port,
                command,
                params,
                ..
            } => {
                assert!(ip.is_none());
                assert!(port.is_none());
                assert_eq!(command, "pl_pause");
                assert_eq!(params.get("id"), Some(&json!(3)));
            }
            other => panic!("expected Command, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"reboot"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn outbound_frames_use_type_tags() {
        let ack = ServerMessage::Subscribed {
            ip: "10.0.0.5".to_string(),
            port: 8080,
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"type":"subscribed","ip":"10.0.0.5","port":8080})
        );

        let result = ServerMessage::CommandResult {
            result: vlc_client::CommandResult {
                ok: true,
                body: "<root/>".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"type":"commandResult","result":{"ok":true,"body":"<root/>"}})
        );

        assert_eq!(
            serde_json::to_value(ServerMessage::Unsubscribed).unwrap(),
            json!({"type":"unsubscribed"})
        );
    }
}
