//! Per-connection handler: read loop, writer task, disconnect cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that encodes outbound packets and sends them
//!   2. Loop: receive messages → hand them to the directory
//!   3. On close, stop the writer and report the disconnect

use std::sync::Arc;

use quizhall_game::QuizRepository;
use quizhall_protocol::{Codec, PacketCodec, ServerPacket};
use quizhall_transport::{Connection, ConnectionId};
use tokio::sync::mpsc;

use crate::QuizhallError;
use crate::server::ServerState;

/// Drop guard that reports the disconnect to the directory when the
/// handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct DisconnectGuard<R: QuizRepository, C: Codec> {
    connection: ConnectionId,
    state: Arc<ServerState<R, C>>,
}

impl<R: QuizRepository, C: Codec> Drop for DisconnectGuard<R, C> {
    fn drop(&mut self) {
        let connection = self.connection;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut directory = state.directory.lock().await;
            if let Err(e) = directory.disconnect(connection).await {
                tracing::debug!(%connection, error = %e, "disconnect cleanup failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<Conn, R, C>(
    conn: Conn,
    state: Arc<ServerState<R, C>>,
) -> Result<(), QuizhallError>
where
    Conn: Connection,
    R: QuizRepository,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound, packets) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), packets, state.codec.clone()));
    let _guard = DisconnectGuard {
        connection: conn_id,
        state: Arc::clone(&state),
    };

    let result = loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break Err(QuizhallError::Transport(e));
            }
        };

        state
            .directory
            .lock()
            .await
            .dispatch(conn_id, &outbound, &data)
            .await;
    };

    // Game actors hold clones of `outbound`; the writer stops only here.
    writer.abort();
    // _guard drops here → directory disconnect fires.
    result
}

/// Drains one connection's outbound channel onto the wire.
async fn write_loop<Conn, C>(
    conn: Arc<Conn>,
    mut packets: mpsc::UnboundedReceiver<ServerPacket>,
    codec: PacketCodec<C>,
) where
    Conn: Connection,
    C: Codec,
{
    let conn_id = conn.id();
    while let Some(packet) = packets.recv().await {
        let bytes = match codec.encode_server(&packet) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, tag = packet.tag(), "encode failed");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
