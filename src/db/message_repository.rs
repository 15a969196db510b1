use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::error;

use crate::errors::AppError;
use crate::models::{Message, Sender};

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full history of a room, creation-time ascending. The id tiebreak keeps
    /// the order deterministic when two writes land on the same timestamp.
    pub async fn find_by_room_id(&self, room_id: &str) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(
            "SELECT id, room_id, sender, text, created_at
             FROM messages
             WHERE room_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch messages for room {room_id}: {e}");
            AppError::db_query(format!("Failed to fetch messages for room {room_id}"), e)
        })?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// The `limit` most recent messages of a room, returned oldest-first so
    /// they can be replayed as completion history without re-sorting.
    pub async fn find_recent(&self, room_id: &str, limit: i64) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(
            "SELECT id, room_id, sender, text, created_at FROM (
                 SELECT id, room_id, sender, text, created_at
                 FROM messages
                 WHERE room_id = $1
                 ORDER BY created_at DESC, id DESC
                 LIMIT $2
             ) recent
             ORDER BY created_at ASC, id ASC",
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch recent messages for room {room_id}: {e}");
            AppError::db_query("Failed to fetch recent messages", e)
        })?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// Persists a message with a database-assigned creation timestamp and
    /// returns the stored row.
    pub async fn insert(
        &self,
        id: &str,
        room_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, AppError> {
        let row = sqlx::query(
            "INSERT INTO messages (id, room_id, sender, text, created_at)
             VALUES ($1, $2, $3, $4, now())
             RETURNING id, room_id, sender, text, created_at",
        )
        .bind(id)
        .bind(room_id)
        .bind(sender.as_str())
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert message {id}: {e}");
            AppError::db_query("Failed to insert message", e)
        })?;

        row_to_message(row)
    }
}

fn row_to_message(row: PgRow) -> Result<Message, AppError> {
    let sender_str: String = row
        .try_get("sender")
        .map_err(|e| AppError::db_query("Failed to read sender", e))?;
    let sender = Sender::try_from(sender_str)
        .map_err(|e| AppError::Unexpected(format!("Unknown message sender: {e}")))?;
    Ok(Message {
        id: row
            .try_get("id")
            .map_err(|e| AppError::db_query("Failed to read id", e))?,
        room_id: row
            .try_get("room_id")
            .map_err(|e| AppError::db_query("Failed to read room_id", e))?,
        sender,
        text: row
            .try_get("text")
            .map_err(|e| AppError::db_query("Failed to read text", e))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| AppError::db_query("Failed to read created_at", e))?,
    })
}
