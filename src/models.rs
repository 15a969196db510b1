use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account created through `/api/auth/register`.
///
/// The bcrypt hash never leaves the process: it is skipped on serialization
/// so a `User` can be embedded directly in API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A bearer-token login session. Expired rows are treated as absent.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A named, user-owned container for an ordered sequence of messages.
///
/// `created_at` is assigned by the database clock at insert time, never by
/// the submitting client.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Who authored a message: the human or the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Sender {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("Unknown sender: {other}")),
        }
    }
}

/// One entry of a room's history. Append-only: never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The role a turn plays in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One `{role, content}` pair of the ephemeral completion request.
/// Rebuilt from persisted history on every send, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionTurn {
    pub role: TurnRole,
    pub content: String,
}

impl CompletionTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: TurnRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: TurnRole::Assistant, content: content.into() }
    }
}

impl From<&Message> for CompletionTurn {
    fn from(m: &Message) -> Self {
        match m.sender {
            Sender::User => CompletionTurn::user(m.text.clone()),
            Sender::Bot => CompletionTurn::assistant(m.text.clone()),
        }
    }
}

// ── API payloads ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Frame a client sends on a room socket to start an assistant round-trip.
#[derive(Debug, Deserialize)]
pub struct SendFrame {
    pub message: String,
}

/// Server-to-client WebSocket events, internally tagged for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    /// Full replace of a room's message list, in creation order.
    #[serde(rename = "snapshot")]
    Snapshot { messages: Vec<Message> },
    /// Full replace of the caller's room list, in creation order.
    #[serde(rename = "rooms")]
    Rooms { rooms: Vec<Room> },
    #[serde(rename = "stream_start")]
    StreamStart,
    #[serde(rename = "stream_chunk")]
    StreamChunk { content: String },
    /// The assistant reply was persisted; carries the stored message.
    #[serde(rename = "stream_end")]
    StreamEnd { message: Message },
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_round_trips_through_strings() {
        for sender in [Sender::User, Sender::Bot] {
            let parsed = Sender::try_from(sender.as_str().to_string()).unwrap();
            assert_eq!(parsed, sender);
        }
        assert!(Sender::try_from("assistant".to_string()).is_err());
    }

    #[test]
    fn sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
    }

    #[test]
    fn completion_turn_maps_bot_to_assistant() {
        let msg = Message {
            id: "m1".into(),
            room_id: "r1".into(),
            sender: Sender::Bot,
            text: "hi".into(),
            created_at: Utc::now(),
        };
        let turn = CompletionTurn::from(&msg);
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.content, "hi");
    }

    #[test]
    fn ws_events_use_stable_tags() {
        let start = serde_json::to_value(&WsEvent::StreamStart).unwrap();
        assert_eq!(start["type"], "stream_start");

        let chunk = serde_json::to_value(&WsEvent::StreamChunk { content: "a".into() }).unwrap();
        assert_eq!(chunk["type"], "stream_chunk");
        assert_eq!(chunk["content"], "a");

        let err = serde_json::to_value(&WsEvent::Error { message: "boom".into() }).unwrap();
        assert_eq!(err["type"], "error");
    }

    #[test]
    fn user_never_serializes_its_password_hash() {
        let user = User {
            id: "u1".into(),
            email: "a@b.c".into(),
            password_hash: "secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password_hash"));
    }
}
