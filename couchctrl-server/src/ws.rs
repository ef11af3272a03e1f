//! WebSocket plumbing for the persistent control connection.
//!
//! Each upgraded socket gets a registry entry, a writer task draining the
//! session's outbound channel onto the socket, and a read loop feeding
//! parsed frames into the session. Protocol errors never close the
//! connection; only the client (or the transport) does.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use warp::ws::{Message, WebSocket};

use crate::messages::{ClientMessage, ServerMessage};
use crate::routes::AppState;

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (id, session) = state.registry.connect(outbound_tx.clone());
    debug!(%id, "websocket connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(text) => {
                    if sink.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "failed to encode outbound frame"),
            }
        }
        let _ = sink.close().await;
    });

    while let Some(next) = stream.next().await {
        let frame = match next {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%id, %err, "websocket transport error");
                break;
            }
        };
        if frame.is_close() {
            break;
        }
        // Pings are answered by warp; anything non-text is ignored.
        let Ok(text) = frame.to_str() else { continue };

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => session.lock().await.handle(message).await,
            Err(_) => {
                let _ = outbound_tx.send(ServerMessage::Error {
                    error: "invalid json".to_string(),
                });
            }
        }
    }

    // Registry entry goes first, then our session and sender handles, so the
    // writer sees the channel close and drains out.
    state.registry.disconnect(id).await;
    drop(session);
    drop(outbound_tx);
    let _ = writer.await;
    debug!(%id, "websocket closed");
}
