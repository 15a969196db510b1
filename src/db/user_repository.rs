use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new user. A unique violation on the email column is
    /// classified as [`AppError::EmailAlreadyInUse`] so the route layer can
    /// answer with a conflict instead of a generic failure.
    pub async fn insert(&self, id: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, created_at)
             VALUES ($1, $2, $3, now())
             RETURNING id, email, password_hash, created_at",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                return AppError::EmailAlreadyInUse { email: email.to_string() };
            }
            error!("Failed to insert user {email}: {e}");
            AppError::db_query("Failed to insert user", e)
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find user by email: {e}");
            AppError::db_query("Failed to find user", e)
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find user {id}: {e}");
            AppError::db_query(format!("Failed to find user {id}"), e)
        })
    }
}
