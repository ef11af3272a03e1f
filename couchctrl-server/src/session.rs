//! Per-connection subscription state and the status polling loop.
//!
//! A session is either idle or subscribed to exactly one target. Subscribing
//! spawns a periodic task that polls the target and pushes status frames to
//! the connection's outbound channel; re-subscribing replaces the task, so a
//! session never runs two pollers at once.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use vlc_client::{Auth, VlcClient};

use crate::messages::{ClientMessage, ServerMessage, DEFAULT_TARGET_PORT};

/// The target a session is subscribed to.
#[derive(Debug, Clone)]
pub struct SubscriptionTarget {
    pub ip: String,
    pub port: u16,
    pub auth: Option<Auth>,
    pub interval: Duration,
}

/// Handle to a running polling task.
///
/// Dropping the handle cancels the task: the cancel flag flips first, then
/// the task is aborted. The poll loop re-checks the flag and sends under the
/// same lock the canceller takes, so once `drop` returns no further frame
/// from this poller can reach the connection — a result still in flight at
/// cancellation time is discarded.
struct Poller {
    cancelled: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

impl Drop for Poller {
    fn drop(&mut self) {
        *self
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
        self.handle.abort();
    }
}

/// Server-side state for one persistent connection.
pub struct SubscriptionSession {
    client: VlcClient,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    target: Option<SubscriptionTarget>,
    poller: Option<Poller>,
}

impl SubscriptionSession {
    /// Create an idle session pushing frames into `outbound`.
    pub fn new(outbound: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            client: VlcClient::new(),
            outbound,
            target: None,
            poller: None,
        }
    }

    /// Dispatch one parsed inbound frame.
    pub async fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Subscribe {
                ip,
                port,
                interval,
                auth,
            } => self.subscribe(SubscriptionTarget {
                ip,
                port,
                auth,
                interval: Duration::from_millis(interval),
            }),
            ClientMessage::Unsubscribe => self.unsubscribe(),
            ClientMessage::Command {
                ip,
                port,
                command,
                params,
                auth,
            } => self.command(ip, port, &command, &params, auth.as_ref()).await,
        }
    }

    /// Start polling `target`, replacing any previous poller first, and
    /// acknowledge immediately. One failed tick pushes an error frame and
    /// the loop keeps going.
    pub fn subscribe(&mut self, target: SubscriptionTarget) {
        // Never two pollers for one session: the old one dies before the
        // new target is recorded.
        self.poller = None;

        let cancelled = Arc::new(Mutex::new(false));
        let handle = tokio::spawn(poll_loop(
            self.client.clone(),
            target.clone(),
            self.outbound.clone(),
            Arc::clone(&cancelled),
        ));
        self.poller = Some(Poller { cancelled, handle });

        debug!(ip = %target.ip, port = target.port, "subscribed");
        let ack = ServerMessage::Subscribed {
            ip: target.ip.clone(),
            port: target.port,
        };
        self.target = Some(target);
        self.push(ack);
    }

    /// Stop polling and acknowledge. Idempotent: an idle session still gets
    /// its acknowledgement.
    pub fn unsubscribe(&mut self) {
        self.poller = None;
        self.target = None;
        self.push(ServerMessage::Unsubscribed);
    }

    /// Forward a command, defaulting to the subscribed target when the frame
    /// names none. Works without an active subscription as long as a target
    /// is specified somewhere.
    pub async fn command(
        &mut self,
        ip: Option<String>,
        port: Option<u16>,
        command: &str,
        params: &serde_json::Map<String, serde_json::Value>,
        auth: Option<&Auth>,
    ) {
        let (ip, port) = match (ip, self.target.as_ref()) {
            (Some(ip), _) => (ip, port.unwrap_or(DEFAULT_TARGET_PORT)),
            (None, Some(target)) => (target.ip.clone(), target.port),
            (None, None) => {
                self.push(ServerMessage::Error {
                    error: "missing ip: supply a target or subscribe first".to_string(),
                });
                return;
            }
        };

        match self
            .client
            .send_command(&ip, port, command, params, auth, None)
            .await
        {
            Ok(result) => self.push(ServerMessage::CommandResult { result }),
            Err(err) => self.push(ServerMessage::Error {
                error: err.to_string(),
            }),
        }
    }

    /// Tear the session down on connection close. Safe on an idle session.
    pub fn close(&mut self) {
        self.poller = None;
        self.target = None;
    }

    fn push(&self, message: ServerMessage) {
        // The receiver half lives in the connection's writer task; a closed
        // channel just means the connection is already gone.
        let _ = self.outbound.send(message);
    }
}

/// The periodic polling task: one status probe per tick, serially.
///
/// `interval` with delayed missed ticks means a probe slower than the
/// interval stretches the effective period instead of stacking ticks.
async fn poll_loop(
    client: VlcClient,
    target: SubscriptionTarget,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    cancelled: Arc<Mutex<bool>>,
) {
    // tokio's interval panics on a zero period; a zero interval from the
    // client means "as fast as possible".
    let period = target.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first poll
    // lands one interval after subscribing.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if is_cancelled(&cancelled) {
            break;
        }
        let message = match client
            .get_status(&target.ip, target.port, target.auth.as_ref(), None)
            .await
        {
            Ok(status) => ServerMessage::Status { status },
            Err(err) => ServerMessage::Error {
                error: err.to_string(),
            },
        };
        // Check-and-send under the cancellation lock: a tick in flight when
        // the poller is dropped must not deliver its result.
        {
            let cancelled = cancelled.lock().unwrap_or_else(PoisonError::into_inner);
            if *cancelled {
                break;
            }
            if outbound.send(message).is_err() {
                break;
            }
        }
    }
}

fn is_cancelled(flag: &Mutex<bool>) -> bool {
    *flag.lock().unwrap_or_else(PoisonError::into_inner)
}
