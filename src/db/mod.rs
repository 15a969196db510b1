pub mod message_repository;
pub mod room_repository;
pub mod session_repository;
pub mod user_repository;
