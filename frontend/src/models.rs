use serde::{Deserialize, Serialize};

/// Matches the backend `User` as it appears in API responses (no hash).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// Matches the backend `Room` model.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: String,
}

/// Matches the backend `Message` model.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub sender: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Frame sent on a room socket to start an assistant round-trip.
#[derive(Clone, Debug, Serialize)]
pub struct SendFrame {
    pub message: String,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// WebSocket event received from the server (internally tagged).
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    #[serde(rename = "snapshot")]
    Snapshot { messages: Vec<Message> },
    #[serde(rename = "rooms")]
    Rooms { rooms: Vec<Room> },
    #[serde(rename = "stream_start")]
    StreamStart,
    #[serde(rename = "stream_chunk")]
    StreamChunk { content: String },
    #[serde(rename = "stream_end")]
    StreamEnd { message: Message },
    #[serde(rename = "error")]
    Error { message: String },
}
