//! Wire messages exchanged over room WebSockets.
//!
//! Every frame is a JSON text message carrying a `type` field. Three types
//! are reserved for the server (`welcome`, `participants`, `presence`), one
//! is rewritten by the server (`profile`), and everything else passes
//! through the relay untouched. [`classify_inbound`] applies those rules to
//! client frames before they reach a room actor.

use serde::{Deserialize, Serialize};

/// Messages the relay itself constructs and delivers to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Tells a freshly joined connection its own identity.
    #[serde(rename_all = "camelCase")]
    Welcome { client_id: String },
    /// Snapshot of everyone currently in the room, sent once on join.
    Participants { participants: Vec<ParticipantEntry> },
    /// Announces a participant joining or leaving.
    #[serde(rename_all = "camelCase")]
    Presence {
        action: PresenceAction,
        client_id: String,
        ts: String,
    },
    /// Canonical display-name announcement, rebuilt from a client `profile`
    /// frame so the sender identity cannot be spoofed.
    #[serde(rename_all = "camelCase")]
    Profile {
        client_id: String,
        display_name: String,
    },
}

/// Direction of a presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    Join,
    Leave,
}

/// One row of a participants snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A client frame that survived inbound filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    /// Valid profile announcement. The room records the name and broadcasts
    /// the canonical form itself.
    Profile { display_name: String },
    /// Opaque payload, forwarded byte-for-byte.
    Opaque(String),
}

#[derive(Deserialize)]
struct TypeEnvelope {
    #[serde(default, rename = "type")]
    msg_type: String,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    #[serde(default, rename = "displayName")]
    display_name: String,
}

/// Filters one inbound client frame.
///
/// Server-reserved types are dropped so clients cannot forge membership
/// traffic. A `profile` frame must carry a non-empty `displayName` or it is
/// dropped too. Anything else, including frames that are not JSON objects at
/// all, is relayed unchanged.
#[must_use]
pub fn classify_inbound(text: String) -> Option<RelayFrame> {
    let Ok(envelope) = serde_json::from_str::<TypeEnvelope>(&text) else {
        return Some(RelayFrame::Opaque(text));
    };

    match envelope.msg_type.as_str() {
        "welcome" | "participants" | "presence" => None,
        "profile" => {
            let Ok(profile) = serde_json::from_str::<ProfileEnvelope>(&text) else {
                return None;
            };
            if profile.display_name.is_empty() {
                return None;
            }
            Some(RelayFrame::Profile {
                display_name: profile.display_name,
            })
        }
        _ => Some(RelayFrame::Opaque(text)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_welcome_serializes_with_camel_case_fields() {
        let msg = ServerMessage::Welcome {
            client_id: "abc123".to_string(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "welcome", "clientId": "abc123"}));
    }

    #[test]
    fn test_participants_snapshot_omits_missing_display_names() {
        let msg = ServerMessage::Participants {
            participants: vec![
                ParticipantEntry {
                    id: "alice".to_string(),
                    display_name: Some("Alice".to_string()),
                },
                ParticipantEntry {
                    id: "bob".to_string(),
                    display_name: None,
                },
            ],
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "participants",
                "participants": [
                    {"id": "alice", "displayName": "Alice"},
                    {"id": "bob"},
                ],
            })
        );
    }

    #[test]
    fn test_presence_serializes_action_and_timestamp() {
        let msg = ServerMessage::Presence {
            action: PresenceAction::Leave,
            client_id: "alice".to_string(),
            ts: "2025-01-01T00:00:00Z".to_string(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "presence",
                "action": "leave",
                "clientId": "alice",
                "ts": "2025-01-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn test_profile_serializes_canonical_form() {
        let msg = ServerMessage::Profile {
            client_id: "alice".to_string(),
            display_name: "Alice".to_string(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "profile", "clientId": "alice", "displayName": "Alice"})
        );
    }

    #[test]
    fn test_reserved_types_are_dropped() {
        for reserved in ["welcome", "participants", "presence"] {
            let text = json!({"type": reserved, "clientId": "forged"}).to_string();
            assert_eq!(classify_inbound(text), None, "type {reserved} should drop");
        }
    }

    #[test]
    fn test_valid_profile_yields_display_name_only() {
        let text =
            json!({"type": "profile", "clientId": "spoofed", "displayName": "Mallory"}).to_string();

        // The clientId in the frame is discarded. The room substitutes the
        // sender's verified identity when it rebroadcasts.
        assert_eq!(
            classify_inbound(text),
            Some(RelayFrame::Profile {
                display_name: "Mallory".to_string()
            })
        );
    }

    #[test]
    fn test_profile_without_display_name_is_dropped() {
        let missing = json!({"type": "profile"}).to_string();
        assert_eq!(classify_inbound(missing), None);

        let empty = json!({"type": "profile", "displayName": ""}).to_string();
        assert_eq!(classify_inbound(empty), None);

        let wrong_type = json!({"type": "profile", "displayName": 42}).to_string();
        assert_eq!(classify_inbound(wrong_type), None);
    }

    #[test]
    fn test_unknown_types_are_relayed_verbatim() {
        let text = json!({"type": "chat", "body": "hello"}).to_string();
        assert_eq!(
            classify_inbound(text.clone()),
            Some(RelayFrame::Opaque(text))
        );
    }

    #[test]
    fn test_untyped_object_is_relayed() {
        let text = json!({"body": "no type field"}).to_string();
        assert_eq!(
            classify_inbound(text.clone()),
            Some(RelayFrame::Opaque(text))
        );
    }

    #[test]
    fn test_non_json_payloads_are_relayed() {
        for raw in ["not json at all", "[1, 2, 3]", "\"bare string\"", ""] {
            let text = raw.to_string();
            assert_eq!(
                classify_inbound(text.clone()),
                Some(RelayFrame::Opaque(text)),
                "payload {raw:?} should relay"
            );
        }
    }
}
