use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::errors::AppError;
use crate::models::CredentialsRequest;
use crate::routes::AuthedUser;
use crate::state::AppState;

/// POST `/api/auth/register` — create an account and open a session.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    match state.auth.register(&req.email, &req.password).await {
        Ok(auth) => (StatusCode::CREATED, Json(auth)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/auth/login` — verify credentials and open a session.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    match state.auth.login(&req.email, &req.password).await {
        Ok(auth) => Json(auth).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/api/auth/logout` — delete the caller's session. The extractor has
/// already proven the token valid, so the header re-read cannot fail.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    AuthedUser(_user): AuthedUser,
) -> Response {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .trim()
        .to_string();

    match state.auth.logout(&token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

pub(crate) fn error_response(err: &AppError) -> Response {
    (
        err.status_code(),
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}
