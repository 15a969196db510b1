use axum::http::StatusCode;
use thiserror::Error;

/// Top-level application error. Every variant carries a human-readable
/// message suitable for display; classification helpers drive the HTTP
/// status mapping in the route layer.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    // ── Auth errors ──────────────────────────────────────────────────────────
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email '{email}' is already in use")]
    EmailAlreadyInUse { email: String },

    #[error("Missing or expired session token")]
    Unauthorized,

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    #[error("'{email}' is not a valid email address")]
    InvalidEmail { email: String },

    // ── Room errors ──────────────────────────────────────────────────────────
    #[error("Room '{id}' not found")]
    RoomNotFound { id: String },

    #[error("A room named '{name}' already exists")]
    RoomNameTaken { name: String },

    // ── Completion errors ────────────────────────────────────────────────────
    #[error("Completion provider unavailable at {host}")]
    CompletionUnavailable { host: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::EmptyField { .. }
                | AppError::FieldTooLong { .. }
                | AppError::InvalidEmail { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::RoomNotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::RoomNameTaken { .. } | AppError::EmailAlreadyInUse { .. }
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized | AppError::InvalidCredentials)
    }

    pub fn is_provider_unavailable(&self) -> bool {
        matches!(self, AppError::CompletionUnavailable { .. })
    }

    /// Single place where errors become HTTP statuses.
    pub fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_conflict() {
            StatusCode::CONFLICT
        } else if self.is_provider_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_stable() {
        let cases = [
            (AppError::EmptyField { field_name: "message".into() }, StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::RoomNotFound { id: "x".into() }, StatusCode::NOT_FOUND),
            (AppError::RoomNameTaken { name: "Team Sync".into() }, StatusCode::CONFLICT),
            (
                AppError::EmailAlreadyInUse { email: "a@b.c".into() },
                StatusCode::CONFLICT,
            ),
            (
                AppError::CompletionUnavailable { host: "api".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Unexpected("?".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn credential_errors_do_not_leak_which_field_was_wrong() {
        assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid email or password");
    }
}
