use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::{AuthSession, User};

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        token: &str,
        user_id: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AuthSession, AppError> {
        sqlx::query_as::<_, AuthSession>(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES ($1, $2, now(), $3)
             RETURNING token, user_id, created_at, expires_at",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert session for user {user_id}: {e}");
            AppError::db_query("Failed to insert session", e)
        })
    }

    /// Resolves a token to its user, ignoring expired sessions.
    pub async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.password_hash, u.created_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to resolve session token: {e}");
            AppError::db_query("Failed to resolve session", e)
        })
    }

    pub async fn delete(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete session: {e}");
                AppError::db_query("Failed to delete session", e)
            })?;
        Ok(())
    }
}
