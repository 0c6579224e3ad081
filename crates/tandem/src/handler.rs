//! Per-connection handler: reader loop plus a writer task.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the relay, handing it the outbound channel
//!   2. Spawn the writer, which drains that channel onto the socket
//!   3. Loop: receive frames, decode, forward to the relay in order
//!   4. On exit the guard reports the close to the relay

use std::sync::Arc;

use tandem_protocol::{ClientMessage, Codec};
use tandem_room::{Outbound, RelayHandle};
use tandem_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::TandemError;
use crate::server::ServerState;

/// Drop guard that tells the relay the connection is gone.
///
/// Runs even if the handler returns early with an error. `Drop` is
/// synchronous, so the notification is a fire-and-forget task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    relay: RelayHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let relay = self.relay.clone();
        tokio::spawn(async move {
            let _ = relay.closed(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TandemError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    state.relay.open(conn_id, tx).await?;
    let _guard = ConnectionGuard {
        conn_id,
        relay: state.relay.clone(),
    };

    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    loop {
        let data = tokio::select! {
            _ = &mut writer => {
                tracing::debug!(%conn_id, "writer finished, closing reader");
                break;
            }
            received = conn.recv() => match received {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::debug!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::trace!(%conn_id, error = %e, "malformed frame dropped");
                continue;
            }
        };

        state.relay.message(conn_id, msg).await?;
    }

    writer.abort();
    // _guard drops here → relay sees the close.
    Ok(())
}

/// Drains the relay's outbound queue for one connection onto its socket.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    let conn_id = conn.id();
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Message(msg) => {
                let text = match state.codec.encode(&msg) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "failed to encode message");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&text).await {
                    tracing::debug!(%conn_id, error = %e, "send failed");
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(%conn_id, error = %e, "close failed");
                }
                break;
            }
        }
    }
}
