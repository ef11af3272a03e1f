//! Process-wide table of live connections and their sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::messages::ServerMessage;
use crate::session::SubscriptionSession;

/// Identity of one persistent connection.
///
/// Minted per upgrade rather than derived from any transport object, so the
/// registry stays decoupled from the socket library's types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Maps connection identities to their sessions.
///
/// One entry per live connection. Insert and remove are the only shared
/// operations; per-session state is only ever touched through that
/// session's own handler task, so no global lock is needed beyond the map's.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Arc<Mutex<SubscriptionSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh idle session for a new connection.
    pub fn connect(
        &self,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> (ConnectionId, Arc<Mutex<SubscriptionSession>>) {
        let id = ConnectionId::new();
        let session = Arc::new(Mutex::new(SubscriptionSession::new(outbound)));
        self.sessions.insert(id, Arc::clone(&session));
        debug!(%id, connections = self.sessions.len(), "connection registered");
        (id, session)
    }

    /// Drop a connection's entry and tear its session down.
    ///
    /// The entry is removed first, then the session closed — and this runs
    /// for every teardown, subscribed or not. Unknown ids are a no-op.
    pub async fn disconnect(&self, id: ConnectionId) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            session.lock().await.close();
            debug!(%id, connections = self.sessions.len(), "connection removed");
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
