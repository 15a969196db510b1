use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::Room;
use crate::service::room_service::RoomStore;

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RoomStore for RoomRepository {
    /// All rooms owned by `user_id`, oldest first.
    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Room>, AppError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, name, user_id, created_at FROM rooms
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch rooms for user {user_id}: {e}");
            AppError::db_query("Failed to fetch rooms", e)
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, AppError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, name, user_id, created_at FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find room {id}: {e}");
            AppError::db_query(format!("Failed to find room {id}"), e)
        })
    }

    /// The advisory duplicate-name probe: at most one match per (owner, name).
    async fn find_by_owner_and_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Room>, AppError> {
        sqlx::query_as::<_, Room>(
            "SELECT id, name, user_id, created_at FROM rooms
             WHERE user_id = $1 AND name = $2
             LIMIT 1",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to probe room name for user {user_id}: {e}");
            AppError::db_query("Failed to probe room name", e)
        })
    }

    /// Inserts a room with a database-assigned creation timestamp.
    async fn insert(&self, id: &str, name: &str, user_id: &str) -> Result<Room, AppError> {
        sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (id, name, user_id, created_at)
             VALUES ($1, $2, $3, now())
             RETURNING id, name, user_id, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert room {id}: {e}");
            AppError::db_query("Failed to insert room", e)
        })
    }
}
