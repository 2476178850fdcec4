//! Per-room relay actor.
//!
//! One task owns everything about one room: the live connections, the set of
//! participant identities, and the display-name map. All mutation happens by
//! processing mailbox messages in order, so there is no locking. Delivery to
//! clients never blocks the actor: a connection whose outbound queue is full
//! is shed on the spot.

use crate::actors::registry::RoomRegistry;
use crate::errors::RelayError;
use crate::protocol::{
    classify_inbound, ParticipantEntry, PresenceAction, RelayFrame, ServerMessage,
};
use chrono::{SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;

/// Mailbox depth for a room actor.
pub const ROOM_CHANNEL_BUFFER: usize = 128;

/// Outbound queue depth per connection. A connection that falls this far
/// behind is dropped rather than allowed to stall the room.
pub const SEND_QUEUE_BUFFER: usize = 32;

/// A connection's membership in a room: its identity plus the queue the
/// room delivers frames into.
#[derive(Debug, Clone)]
pub struct Seat {
    pub conn_id: Uuid,
    pub identity: String,
    pub outbound: mpsc::Sender<String>,
}

/// Messages accepted by a room actor.
#[derive(Debug)]
pub enum RoomMessage {
    /// A connection joins. Acknowledged so the caller knows whether the
    /// actor was still alive to process it.
    Register {
        seat: Seat,
        respond_to: oneshot::Sender<()>,
    },
    /// A connection leaves. The identity travels with the message because
    /// the live set may already have shed this connection.
    Unregister { conn_id: Uuid, identity: String },
    /// A filtered client frame to fan out.
    Relay {
        sender_conn: Uuid,
        sender_identity: String,
        frame: RelayFrame,
    },
}

/// Cloneable handle to one room actor instance.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: String,
    instance: Uuid,
}

impl RoomHandle {
    /// Registers a connection and waits for the actor's acknowledgement.
    ///
    /// Fails with [`RelayError::RoomClosed`] when the actor has already
    /// exited; callers fetch a fresh handle from the registry and retry.
    pub async fn register(&self, seat: Seat) -> Result<(), RelayError> {
        let (respond_to, ack) = oneshot::channel();
        self.sender
            .send(RoomMessage::Register { seat, respond_to })
            .await
            .map_err(|_| RelayError::RoomClosed)?;
        ack.await.map_err(|_| RelayError::RoomClosed)
    }

    /// Removes a connection from the room.
    pub async fn unregister(&self, conn_id: Uuid, identity: &str) -> Result<(), RelayError> {
        self.sender
            .send(RoomMessage::Unregister {
                conn_id,
                identity: identity.to_string(),
            })
            .await
            .map_err(|_| RelayError::RoomClosed)
    }

    /// Applies inbound filtering to one client frame and relays survivors.
    /// Dropped frames are not an error.
    pub async fn handle_incoming(
        &self,
        sender_conn: Uuid,
        sender_identity: &str,
        text: String,
    ) -> Result<(), RelayError> {
        let frame_size = text.len();
        let Some(frame) = classify_inbound(text) else {
            return Ok(());
        };

        if matches!(frame, RelayFrame::Opaque(_)) {
            tracing::debug!(
                target: "relay.actor.room",
                room_id = %self.room_id,
                conn_id = %sender_conn,
                frame_size,
                "Relaying message"
            );
        }

        self.sender
            .send(RoomMessage::Relay {
                sender_conn,
                sender_identity: sender_identity.to_string(),
                frame,
            })
            .await
            .map_err(|_| RelayError::RoomClosed)
    }

    /// True once the actor has exited and this handle is stale.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Identifies which actor incarnation this handle points at.
    #[must_use]
    pub fn instance(&self) -> Uuid {
        self.instance
    }
}

struct RoomClient {
    identity: String,
    outbound: mpsc::Sender<String>,
}

/// The actor task behind a [`RoomHandle`].
pub struct RoomActor {
    room_id: String,
    instance: Uuid,
    receiver: mpsc::Receiver<RoomMessage>,
    registry: RoomRegistry,
    cancel_token: CancellationToken,
    clients: HashMap<Uuid, RoomClient>,
    participants: HashSet<String>,
    display_names: HashMap<String, String>,
}

impl RoomActor {
    /// Spawns the actor task and returns its handle.
    pub(crate) fn spawn(
        room_id: String,
        registry: RoomRegistry,
        cancel_token: CancellationToken,
    ) -> (RoomHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(ROOM_CHANNEL_BUFFER);
        let instance = Uuid::new_v4();

        let actor = RoomActor {
            room_id: room_id.clone(),
            instance,
            receiver,
            registry,
            cancel_token,
            clients: HashMap::new(),
            participants: HashSet::new(),
            display_names: HashMap::new(),
        };
        let handle = RoomHandle {
            sender,
            room_id,
            instance,
        };

        let join_handle = tokio::spawn(actor.run());
        (handle, join_handle)
    }

    #[instrument(skip_all, name = "room", fields(room_id = %self.room_id))]
    async fn run(mut self) {
        tracing::info!(target: "relay.actor.room", instance = %self.instance, "Room actor started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    tracing::info!(target: "relay.actor.room", "Room actor cancelled");
                    break;
                }
                msg = self.receiver.recv() => {
                    match msg {
                        Some(msg) => {
                            if self.handle_message(msg).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        tracing::info!(
            target: "relay.actor.room",
            connections = self.clients.len(),
            participants = self.participants.len(),
            "Room actor stopped"
        );
    }

    /// Returns true when the room has emptied and the actor should exit.
    async fn handle_message(&mut self, msg: RoomMessage) -> bool {
        match msg {
            RoomMessage::Register { seat, respond_to } => {
                self.handle_register(seat, respond_to);
                false
            }
            RoomMessage::Unregister { conn_id, identity } => {
                self.handle_unregister(conn_id, &identity).await
            }
            RoomMessage::Relay {
                sender_conn,
                sender_identity,
                frame,
            } => {
                self.handle_relay(sender_conn, &sender_identity, frame);
                false
            }
        }
    }

    fn handle_register(&mut self, seat: Seat, respond_to: oneshot::Sender<()>) {
        let Seat {
            conn_id,
            identity,
            outbound,
        } = seat;

        self.clients.insert(
            conn_id,
            RoomClient {
                identity: identity.clone(),
                outbound,
            },
        );
        self.participants.insert(identity.clone());

        // The ack only confirms the join landed. If the caller vanished in
        // the meantime the shed path cleans up on first delivery.
        let _ = respond_to.send(());

        self.send_to_client(
            conn_id,
            &ServerMessage::Welcome {
                client_id: identity.clone(),
            },
        );

        let entries: Vec<ParticipantEntry> = self
            .participants
            .iter()
            .map(|id| ParticipantEntry {
                id: id.clone(),
                display_name: self.display_names.get(id).cloned(),
            })
            .collect();
        self.send_to_client(
            conn_id,
            &ServerMessage::Participants {
                participants: entries,
            },
        );

        self.broadcast(
            &ServerMessage::Presence {
                action: PresenceAction::Join,
                client_id: identity,
                ts: rfc3339_now(),
            },
            Some(conn_id),
        );

        tracing::info!(
            target: "relay.actor.room",
            conn_id = %conn_id,
            connections = self.clients.len(),
            "Connection registered"
        );
    }

    async fn handle_unregister(&mut self, conn_id: Uuid, identity: &str) -> bool {
        self.clients.remove(&conn_id);

        // The identity stays a participant while any other connection still
        // carries it. Only the last departure is announced.
        let has_other = self.clients.values().any(|c| c.identity == identity);
        if !has_other && self.participants.remove(identity) {
            self.display_names.remove(identity);
            self.broadcast(
                &ServerMessage::Presence {
                    action: PresenceAction::Leave,
                    client_id: identity.to_string(),
                    ts: rfc3339_now(),
                },
                None,
            );
        }

        tracing::info!(
            target: "relay.actor.room",
            conn_id = %conn_id,
            connections = self.clients.len(),
            "Connection unregistered"
        );

        if self.clients.is_empty() {
            self.registry
                .remove_instance(&self.room_id, self.instance)
                .await;
            return true;
        }
        false
    }

    fn handle_relay(&mut self, sender_conn: Uuid, sender_identity: &str, frame: RelayFrame) {
        match frame {
            RelayFrame::Profile { display_name } => {
                self.display_names
                    .insert(sender_identity.to_string(), display_name.clone());
                self.broadcast(
                    &ServerMessage::Profile {
                        client_id: sender_identity.to_string(),
                        display_name,
                    },
                    Some(sender_conn),
                );
            }
            RelayFrame::Opaque(text) => {
                self.fan_out(text, Some(sender_conn));
            }
        }
    }

    fn send_to_client(&mut self, conn_id: Uuid, msg: &ServerMessage) {
        let Ok(text) = serde_json::to_string(msg) else {
            return;
        };
        self.deliver(conn_id, text);
    }

    fn broadcast(&mut self, msg: &ServerMessage, skip: Option<Uuid>) {
        let Ok(text) = serde_json::to_string(msg) else {
            return;
        };
        self.fan_out(text, skip);
    }

    fn fan_out(&mut self, text: String, skip: Option<Uuid>) {
        // Delivery mutates the client map on failure, so collect targets
        // first.
        let targets: Vec<Uuid> = self
            .clients
            .keys()
            .copied()
            .filter(|id| Some(*id) != skip)
            .collect();
        for conn_id in targets {
            self.deliver(conn_id, text.clone());
        }
    }

    /// Non-blocking delivery. A full or closed queue drops the connection;
    /// closing its queue makes the writer half tear the socket down.
    fn deliver(&mut self, conn_id: Uuid, text: String) {
        let Some(client) = self.clients.get(&conn_id) else {
            return;
        };
        if client.outbound.try_send(text).is_err() {
            self.clients.remove(&conn_id);
            tracing::warn!(
                target: "relay.actor.room",
                conn_id = %conn_id,
                "Outbound queue full or closed, shedding connection"
            );
        }
    }
}

fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
