//! Process-wide map from room identifier to live room actor.

use crate::actors::room::{RoomActor, RoomHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shared registry of live rooms. Cheap to clone.
///
/// Lookups take the read lock; creation re-checks under the write lock so
/// concurrent joins to a new room land on the same actor. A handle whose
/// actor has exited counts as absent and is replaced in place, and removal
/// is guarded by the actor instance id so a report from a finished actor
/// can never evict its replacement.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, RoomHandle>>>,
    cancel_token: CancellationToken,
}

impl RoomRegistry {
    #[must_use]
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            cancel_token,
        }
    }

    /// Returns the live actor for `room_id`, spawning one if the room is
    /// unknown or its previous actor has exited.
    pub async fn get_or_create(&self, room_id: &str) -> RoomHandle {
        {
            let rooms = self.rooms.read().await;
            if let Some(handle) = rooms.get(room_id) {
                if !handle.is_closed() {
                    return handle.clone();
                }
            }
        }

        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let (handle, _join_handle) = RoomActor::spawn(
            room_id.to_string(),
            self.clone(),
            self.cancel_token.child_token(),
        );
        tracing::info!(
            target: "relay.registry",
            room_id = %room_id,
            instance = %handle.instance(),
            "Room created"
        );
        rooms.insert(room_id.to_string(), handle.clone());
        handle
    }

    /// Drops the registration for `room_id`, but only while it still points
    /// at `instance`. Stale reports from replaced actors are ignored.
    pub async fn remove_instance(&self, room_id: &str, instance: Uuid) {
        let mut rooms = self.rooms.write().await;
        if rooms
            .get(room_id)
            .is_some_and(|handle| handle.instance() == instance)
        {
            rooms.remove(room_id);
            tracing::info!(target: "relay.registry", room_id = %room_id, "Room removed");
        }
    }

    /// Number of registered rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
