use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::CreateRoomRequest;
use crate::routes::auth_routes::error_response;
use crate::routes::AuthedUser;
use crate::state::AppState;

/// GET `/api/rooms` — the caller's rooms, creation-time ascending.
pub async fn list_rooms_handler(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> Response {
    match state.rooms.list(&user.id).await {
        Ok(rooms) => Json(rooms).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/rooms` — create a room; 409 when the caller already has one
/// with that name.
pub async fn create_room_handler(
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
    Json(req): Json<CreateRoomRequest>,
) -> Response {
    match state.rooms.create(&user.id, &req.name).await {
        Ok(room) => (StatusCode::CREATED, Json(room)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/api/rooms/{id}/messages` — ordered history of an owned room.
pub async fn list_messages_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    AuthedUser(user): AuthedUser,
) -> Response {
    match state.chat.messages(&id, &user.id).await {
        Ok(msgs) => Json(msgs).into_response(),
        Err(e) => error_response(&e),
    }
}
