use tracing::info;
use uuid::Uuid;

use crate::db::room_repository::RoomRepository;
use crate::errors::AppError;
use crate::feed::FeedHub;
use crate::models::Room;

const MAX_ROOM_NAME_LENGTH: usize = 120;

/// Storage the room service runs against. Production uses the Postgres
/// repository; tests substitute an in-memory store.
pub trait RoomStore {
    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Room>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, AppError>;
    async fn find_by_owner_and_name(
        &self,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Room>, AppError>;
    async fn insert(&self, id: &str, name: &str, user_id: &str) -> Result<Room, AppError>;
}

#[derive(Clone)]
pub struct RoomService<R = RoomRepository> {
    room_repo: R,
    feed: FeedHub,
}

impl<R: RoomStore> RoomService<R> {
    pub fn new(room_repo: R, feed: FeedHub) -> Self {
        Self { room_repo, feed }
    }

    /// Rooms owned by `user_id`, creation-time ascending.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Room>, AppError> {
        self.room_repo.find_by_owner(user_id).await
    }

    /// Creates a uniquely-named room for the owner.
    ///
    /// Uniqueness is a check-then-insert probe, not a constraint: two
    /// concurrent creations with the same name can both land. The check is
    /// advisory UX, so the race stays undefended on purpose.
    pub async fn create(&self, user_id: &str, name: &str) -> Result<Room, AppError> {
        let name = validate_room_name(name)?;

        if self
            .room_repo
            .find_by_owner_and_name(user_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::RoomNameTaken { name });
        }

        let room = self
            .room_repo
            .insert(&Uuid::new_v4().to_string(), &name, user_id)
            .await?;

        info!("User {user_id} created room {} ({})", room.id, room.name);
        self.feed.publish_room_list_change(user_id);
        Ok(room)
    }

    /// Resolves a room and checks ownership. A room owned by someone else is
    /// reported as not found so room ids are not probeable.
    pub async fn owned_room(&self, room_id: &str, user_id: &str) -> Result<Room, AppError> {
        let room = self
            .room_repo
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| AppError::RoomNotFound { id: room_id.to_string() })?;
        if room.user_id != user_id {
            return Err(AppError::RoomNotFound { id: room_id.to_string() });
        }
        Ok(room)
    }
}

fn validate_room_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::EmptyField { field_name: "name".to_string() });
    }
    if name.chars().count() > MAX_ROOM_NAME_LENGTH {
        return Err(AppError::FieldTooLong {
            field_name: "name".to_string(),
            max_length: MAX_ROOM_NAME_LENGTH,
            actual_length: name.chars().count(),
        });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;

    #[derive(Clone, Default)]
    struct InMemoryRooms {
        rooms: Arc<Mutex<Vec<Room>>>,
    }

    impl RoomStore for InMemoryRooms {
        async fn find_by_owner(&self, user_id: &str) -> Result<Vec<Room>, AppError> {
            let rooms = self.rooms.lock().unwrap();
            Ok(rooms.iter().filter(|r| r.user_id == user_id).cloned().collect())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Room>, AppError> {
            let rooms = self.rooms.lock().unwrap();
            Ok(rooms.iter().find(|r| r.id == id).cloned())
        }

        async fn find_by_owner_and_name(
            &self,
            user_id: &str,
            name: &str,
        ) -> Result<Option<Room>, AppError> {
            let rooms = self.rooms.lock().unwrap();
            Ok(rooms
                .iter()
                .find(|r| r.user_id == user_id && r.name == name)
                .cloned())
        }

        async fn insert(&self, id: &str, name: &str, user_id: &str) -> Result<Room, AppError> {
            let room = Room {
                id: id.to_string(),
                name: name.to_string(),
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            };
            self.rooms.lock().unwrap().push(room.clone());
            Ok(room)
        }
    }

    fn service() -> RoomService<InMemoryRooms> {
        RoomService::new(InMemoryRooms::default(), FeedHub::new())
    }

    #[tokio::test]
    async fn duplicate_names_conflict_only_within_one_owner() {
        let rooms = service();
        rooms.create("alice", "Team Sync").await.unwrap();

        // Same owner, same name: rejected.
        assert!(matches!(
            rooms.create("alice", "Team Sync").await,
            Err(AppError::RoomNameTaken { name }) if name == "Team Sync"
        ));

        // Different owner, same name: fine.
        let room = rooms.create("bob", "Team Sync").await.unwrap();
        assert_eq!(room.user_id, "bob");
        assert_eq!(rooms.list("alice").await.unwrap().len(), 1);
        assert_eq!(rooms.list("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rooms_owned_by_someone_else_read_as_not_found() {
        let rooms = service();
        let room = rooms.create("alice", "Private").await.unwrap();

        assert!(rooms.owned_room(&room.id, "alice").await.is_ok());
        assert!(matches!(
            rooms.owned_room(&room.id, "bob").await,
            Err(AppError::RoomNotFound { .. })
        ));
    }

    #[test]
    fn whitespace_only_names_are_rejected() {
        assert!(matches!(
            validate_room_name("   \t"),
            Err(AppError::EmptyField { field_name }) if field_name == "name"
        ));
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(validate_room_name("  Team Sync  ").unwrap(), "Team Sync");
    }

    #[test]
    fn over_long_names_are_rejected() {
        let name = "x".repeat(MAX_ROOM_NAME_LENGTH + 1);
        assert!(matches!(
            validate_room_name(&name),
            Err(AppError::FieldTooLong { .. })
        ));
    }
}
