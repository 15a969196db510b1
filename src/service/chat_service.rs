use uuid::Uuid;

use crate::agent::CompletionAgentService;
use crate::db::message_repository::MessageRepository;
use crate::errors::AppError;
use crate::feed::FeedHub;
use crate::models::{CompletionTurn, Message, Sender};
use crate::service::room_service::RoomService;

/// How many persisted messages are replayed as context on each send.
const HISTORY_WINDOW: i64 = 5;
const MAX_MESSAGE_LENGTH: usize = 8000;

/// Everything the streaming layer needs after a send was validated and the
/// user's message persisted.
#[derive(Debug, Clone)]
pub struct SendContext {
    pub room_id: String,
    /// History window plus the new input, input last.
    pub turns: Vec<CompletionTurn>,
    pub user_message: Message,
}

#[derive(Clone)]
pub struct ChatService {
    rooms: RoomService,
    message_repo: MessageRepository,
    agent: CompletionAgentService,
    feed: FeedHub,
}

impl ChatService {
    pub fn new(
        rooms: RoomService,
        message_repo: MessageRepository,
        agent: CompletionAgentService,
        feed: FeedHub,
    ) -> Self {
        Self { rooms, message_repo, agent, feed }
    }

    pub fn agent(&self) -> &CompletionAgentService {
        &self.agent
    }

    /// Full ordered history of a room the caller owns.
    pub async fn messages(&self, room_id: &str, user_id: &str) -> Result<Vec<Message>, AppError> {
        self.rooms.owned_room(room_id, user_id).await?;
        self.message_repo.find_by_room_id(room_id).await
    }

    /// First half of a send: validate, snapshot the history window, persist
    /// the user's message, and announce it on the live feed.
    ///
    /// The user message is committed before any completion request is built
    /// from the returned context, so the prompt always contains the caller's
    /// latest turn and the feed shows it before streaming begins.
    pub async fn prepare_send(
        &self,
        room_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<SendContext, AppError> {
        let text = validate_message_text(text)?;
        self.rooms.owned_room(room_id, user_id).await?;

        // Snapshot before the insert: the new input is appended separately.
        let history = self.message_repo.find_recent(room_id, HISTORY_WINDOW).await?;
        let turns = build_completion_turns(&history, &text);

        let user_message = self
            .message_repo
            .insert(&Uuid::new_v4().to_string(), room_id, Sender::User, &text)
            .await?;
        self.feed.publish_message_change(room_id);

        Ok(SendContext { room_id: room_id.to_string(), turns, user_message })
    }

    /// Second half of a send: persist the fully concatenated assistant reply
    /// and announce it.
    pub async fn save_assistant_message(
        &self,
        room_id: &str,
        text: &str,
    ) -> Result<Message, AppError> {
        let message = self
            .message_repo
            .insert(&Uuid::new_v4().to_string(), room_id, Sender::Bot, text)
            .await?;
        self.feed.publish_message_change(room_id);
        Ok(message)
    }
}

/// Maps the history window to completion turns and appends the new input as
/// the final user turn.
pub fn build_completion_turns(history: &[Message], input: &str) -> Vec<CompletionTurn> {
    let mut turns: Vec<CompletionTurn> = history.iter().map(CompletionTurn::from).collect();
    turns.push(CompletionTurn::user(input));
    turns
}

fn validate_message_text(text: &str) -> Result<String, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::EmptyField { field_name: "message".to_string() });
    }
    let length = text.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(AppError::FieldTooLong {
            field_name: "message".to_string(),
            max_length: MAX_MESSAGE_LENGTH,
            actual_length: length,
        });
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::TurnRole;

    fn message(sender: Sender, text: &str) -> Message {
        Message {
            id: Uuid::new_v4().to_string(),
            room_id: "room".into(),
            sender,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn input_is_always_the_final_user_turn() {
        let history = vec![message(Sender::User, "Hello"), message(Sender::Bot, "Hi there!")];
        let turns = build_completion_turns(&history, "How are you?");

        assert_eq!(turns.len(), 3);
        let last = turns.last().unwrap();
        assert_eq!(last.role, TurnRole::User);
        assert_eq!(last.content, "How are you?");
    }

    #[test]
    fn senders_map_to_completion_roles() {
        let history = vec![message(Sender::User, "q"), message(Sender::Bot, "a")];
        let turns = build_completion_turns(&history, "next");

        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[test]
    fn empty_history_yields_a_single_turn() {
        let turns = build_completion_turns(&[], "Hello");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "Hello");
    }

    #[test]
    fn history_window_caps_the_request_size() {
        // The repository caps the window at HISTORY_WINDOW; a send built from
        // it can never exceed window + 1 turns.
        let history: Vec<Message> = (0..HISTORY_WINDOW)
            .map(|i| message(if i % 2 == 0 { Sender::User } else { Sender::Bot }, "t"))
            .collect();
        let turns = build_completion_turns(&history, "input");
        assert_eq!(turns.len() as i64, HISTORY_WINDOW + 1);
    }

    #[test]
    fn whitespace_input_is_rejected_before_anything_persists() {
        assert!(matches!(
            validate_message_text("   \n "),
            Err(AppError::EmptyField { field_name }) if field_name == "message"
        ));
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(validate_message_text("  Hello \n").unwrap(), "Hello");
    }

    #[test]
    fn over_long_input_is_rejected() {
        let text = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            validate_message_text(&text),
            Err(AppError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn length_limit_counts_characters_not_bytes() {
        // Multi-byte input at exactly the limit: over in bytes, fine in chars.
        let text = "é".repeat(MAX_MESSAGE_LENGTH);
        assert_eq!(validate_message_text(&text).unwrap(), text);
    }
}
