//! Multi-turn conversation handle over the Gemini API.

use crate::gemini::{Content, GeminiClient};
use rufus_core::error::{Result, RufusError};
use rufus_core::gateway::Conversation;
use tokio::sync::Mutex;

/// One ongoing conversation: an owned, append-only turn history plus the
/// client needed to submit the next turn.
///
/// The upstream API is stateless, so every `send` replays the whole history.
pub struct GeminiConversation {
    client: GeminiClient,
    model: String,
    history: Mutex<Vec<Content>>,
}

impl GeminiConversation {
    pub(crate) fn new(client: GeminiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            history: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Conversation for GeminiConversation {
    // The history lock is held across the API call, so turns within one
    // session run one at a time. A failed call leaves no trace in the
    // history.
    async fn send(&self, message: &str) -> Result<String> {
        let mut history = self.history.lock().await;
        history.push(Content::user_text(message));

        let reply = match self.client.generate(&self.model, &history).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                history.pop();
                return Err(RufusError::upstream(
                    "Gemini API returned no text in the response candidates",
                ));
            }
            Err(err) => {
                history.pop();
                return Err(err);
            }
        };

        history.push(Content::model_text(&reply));
        Ok(reply)
    }
}
