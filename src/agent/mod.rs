use futures_util::StreamExt;
use rig::completion::CompletionModel;
use rig::prelude::CompletionClient;
use rig::providers::openai;
use rig::streaming::StreamedAssistantContent;
use tokio::sync::mpsc;
use tracing::error;

use crate::errors::AppError;
use crate::models::{CompletionTurn, TurnRole};

const PREAMBLE: &str = "You are a helpful AI assistant in a chat room. \
                        Be concise, accurate, and friendly. \
                        If you don't know something, say so.";

/// Streaming completion client over an OpenAI-compatible provider.
///
/// A fresh completion request is built per send so the history is replayed
/// from the database each time; nothing about a conversation is cached here.
#[derive(Clone)]
pub struct CompletionAgentService {
    client: openai::Client,
    host: String,
    model: String,
}

impl CompletionAgentService {
    pub fn new(api_key: &str, base_url: Option<&str>, model: &str) -> Result<Self, AppError> {
        let mut builder = openai::Client::builder().api_key(api_key);
        if let Some(url) = base_url {
            builder = builder.base_url(url);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build completion client: {e}")))?;
        Ok(Self {
            client,
            host: base_url.unwrap_or("api.openai.com").to_string(),
            model: model.to_string(),
        })
    }

    /// Streams one assistant reply for the given turns, forwarding each text
    /// fragment through `tx` as it arrives. The final turn is the prompt;
    /// everything before it is replayed as chat history.
    pub async fn stream_reply(
        &self,
        turns: Vec<CompletionTurn>,
        tx: mpsc::Sender<String>,
    ) -> Result<(), AppError> {
        let mut messages: Vec<rig::message::Message> = turns
            .iter()
            .map(|t| match t.role {
                TurnRole::User => rig::message::Message::user(&t.content),
                TurnRole::Assistant => rig::message::Message::assistant(&t.content),
            })
            .collect();

        let prompt = messages
            .pop()
            .ok_or_else(|| AppError::EmptyField { field_name: "turns".to_string() })?;

        let model = self.client.completion_model(&self.model);
        let mut stream = model
            .completion_request(prompt)
            .messages(messages)
            .preamble(PREAMBLE.to_string())
            .stream()
            .await
            .map_err(|e| self.classify(e.to_string()))?;

        while let Some(item) = stream.next().await {
            match item {
                Ok(StreamedAssistantContent::Text(text)) => {
                    if !text.text.is_empty() && tx.send(text.text).await.is_err() {
                        // Receiver gone: the caller abandoned the stream.
                        return Ok(());
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Completion stream emitted an error chunk: {e}");
                    return Err(self.classify(e.to_string()));
                }
            }
        }

        Ok(())
    }

    fn classify(&self, msg: String) -> AppError {
        if msg.contains("Connection refused") || msg.contains("connect") {
            AppError::CompletionUnavailable { host: self.host.clone() }
        } else {
            AppError::InferenceError { message: msg }
        }
    }
}
