//! One relay connection: a reader half, a writer half, and the seat that
//! bridges them to a room actor.

use crate::actors::registry::RoomRegistry;
use crate::actors::room::{RoomHandle, Seat, SEND_QUEUE_BUFFER};
use crate::errors::RelayError;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

/// How many times a join retries against a fresh actor before giving up.
/// Each failed attempt means the previous actor exited between lookup and
/// registration.
const JOIN_ATTEMPTS: usize = 3;

/// A connection that has been placed in a room and is ready to run.
pub struct Connection {
    conn_id: Uuid,
    identity: String,
    room: RoomHandle,
    outbound: mpsc::Receiver<String>,
    cancel_token: CancellationToken,
}

impl Connection {
    /// Joins `room_id` under `identity`.
    ///
    /// Registration waits for the actor's acknowledgement. A failed ack
    /// means the actor exited underneath us, so the registry is asked for a
    /// replacement and the join is retried a bounded number of times.
    pub async fn join(
        registry: &RoomRegistry,
        room_id: &str,
        identity: String,
        cancel_token: CancellationToken,
    ) -> Result<Self, RelayError> {
        let conn_id = Uuid::new_v4();

        for attempt in 1..=JOIN_ATTEMPTS {
            let room = registry.get_or_create(room_id).await;
            let (outbound_tx, outbound_rx) = mpsc::channel(SEND_QUEUE_BUFFER);
            let seat = Seat {
                conn_id,
                identity: identity.clone(),
                outbound: outbound_tx,
            };

            match room.register(seat).await {
                Ok(()) => {
                    return Ok(Self {
                        conn_id,
                        identity,
                        room,
                        outbound: outbound_rx,
                        cancel_token,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        target: "relay.connection",
                        room_id = %room_id,
                        attempt,
                        error = %e,
                        "Room actor exited during join, retrying"
                    );
                }
            }
        }

        Err(RelayError::JoinFailed)
    }

    #[must_use]
    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Drives the connection until the socket closes, the room sheds it, or
    /// the process shuts down. Always unregisters from the room on the way
    /// out.
    #[instrument(skip_all, name = "connection", fields(conn_id = %self.conn_id))]
    pub async fn run(self, socket: WebSocket) {
        let Connection {
            conn_id,
            identity,
            room,
            mut outbound,
            cancel_token,
        } = self;

        let (mut ws_tx, mut ws_rx) = socket.split();

        let writer_cancel = cancel_token.clone();
        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = writer_cancel.cancelled() => break,
                    maybe_text = outbound.recv() => {
                        match maybe_text {
                            Some(text) => {
                                if ws_tx.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            // Queue closed: the room shed this connection.
                            None => break,
                        }
                    }
                }
            }
            // Closing from this side unblocks the reader.
            let _ = ws_tx.close().await;
        });

        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if room.handle_incoming(conn_id, &identity, text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                // The wire protocol is JSON text. Binary frames and
                // ping/pong control frames carry nothing to relay.
                Ok(_) => {}
            }
        }

        let _ = room.unregister(conn_id, &identity).await;
        cancel_token.cancel();
        let _ = writer.await;

        tracing::info!(target: "relay.connection", conn_id = %conn_id, "Connection closed");
    }
}
