use gloo_net::http::{Request, Response};

use crate::models::{
    AuthResponse, CreateRoomRequest, CredentialsRequest, ErrorBody, Room,
};

/// Base URL of the backend API server.
const API_BASE: &str = "http://localhost:3000";

/// Failure of an authenticated call. `Unauthorized` means the session token
/// was rejected, so the caller should drop the identity and show the sign-in
/// screen instead of an error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    Other(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Session expired"),
            ApiError::Other(message) => write!(f, "{message}"),
        }
    }
}

/// Classifies a non-2xx response on an authenticated call.
async fn api_error(resp: Response) -> ApiError {
    let status = resp.status();
    classify_status(status, error_message(resp).await)
}

/// Pulls the backend's error message out of a non-2xx response, falling back
/// to the bare status code.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("Server error: {status}"),
    }
}

fn classify_status(status: u16, message: String) -> ApiError {
    if status == 401 {
        ApiError::Unauthorized
    } else {
        ApiError::Other(message)
    }
}

pub async fn register(email: &str, password: &str) -> Result<AuthResponse, String> {
    auth_request("register", email, password).await
}

pub async fn login(email: &str, password: &str) -> Result<AuthResponse, String> {
    auth_request("login", email, password).await
}

async fn auth_request(endpoint: &str, email: &str, password: &str) -> Result<AuthResponse, String> {
    let body = CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    };

    let resp = Request::post(&format!("{API_BASE}/api/auth/{endpoint}"))
        .json(&body)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(error_message(resp).await);
    }

    resp.json::<AuthResponse>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

pub async fn logout(token: &str) -> Result<(), String> {
    Request::post(&format!("{API_BASE}/api/auth/logout"))
        .header("Authorization", &format!("Bearer {token}"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    Ok(())
}

pub async fn create_room(token: &str, name: &str) -> Result<Room, ApiError> {
    let body = CreateRoomRequest { name: name.to_string() };

    let resp = Request::post(&format!("{API_BASE}/api/rooms"))
        .header("Authorization", &format!("Bearer {token}"))
        .json(&body)
        .map_err(|e| ApiError::Other(format!("Serialize error: {e}")))?
        .send()
        .await
        .map_err(|e| ApiError::Other(format!("Network error: {e}")))?;

    if !resp.ok() {
        return Err(api_error(resp).await);
    }

    resp.json::<Room>()
        .await
        .map_err(|e| ApiError::Other(format!("Parse error: {e}")))
}

/// Fetches the caller's rooms over REST. Besides populating nothing itself
/// (the live feed owns the room list), this doubles as the session probe: a
/// WebSocket upgrade rejection carries no status, so feed errors are followed
/// by this call to find out whether the session itself is gone.
pub async fn list_rooms(token: &str) -> Result<Vec<Room>, ApiError> {
    let resp = Request::get(&format!("{API_BASE}/api/rooms"))
        .header("Authorization", &format!("Bearer {token}"))
        .send()
        .await
        .map_err(|e| ApiError::Other(format!("Network error: {e}")))?;

    if !resp.ok() {
        return Err(api_error(resp).await);
    }

    resp.json::<Vec<Room>>()
        .await
        .map_err(|e| ApiError::Other(format!("Parse error: {e}")))
}

/// WebSocket URL for the caller's live room-list feed.
pub fn rooms_ws_url(token: &str) -> String {
    format!("ws://localhost:3000/ws/rooms?token={token}")
}

/// WebSocket URL for one room's live feed and send channel.
pub fn room_ws_url(room_id: &str, token: &str) -> String {
    format!("ws://localhost:3000/ws/rooms/{room_id}?token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_401_is_classified_as_unauthorized() {
        assert_eq!(
            classify_status(401, "Unauthorized".to_string()),
            ApiError::Unauthorized
        );
    }

    #[test]
    fn other_statuses_keep_the_server_message() {
        assert_eq!(
            classify_status(409, "A room named Team Sync already exists".to_string()),
            ApiError::Other("A room named Team Sync already exists".to_string())
        );
    }
}
