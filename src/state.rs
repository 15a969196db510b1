use crate::feed::FeedHub;
use crate::service::auth_service::AuthService;
use crate::service::chat_service::ChatService;
use crate::service::room_service::RoomService;

/// Shared handler state: the service layer plus the live-feed hub.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub rooms: RoomService,
    pub chat: ChatService,
    pub feed: FeedHub,
}
