//! Trait seams for the upstream language-model service.
//!
//! The rest of the system consumes these capabilities abstractly so the
//! concrete client can be swapped out, or mocked in tests.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A live multi-turn exchange with the model.
///
/// Implementations own an append-only turn history; `send` submits the next
/// user turn together with everything before it and returns the model reply.
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn send(&self, message: &str) -> Result<String>;
}

/// Completion capabilities of the upstream model service.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// One-shot text completion carrying no session state.
    async fn complete_text(&self, prompt: &str, model: &str) -> Result<String>;

    /// Asks the model to describe the main product in an image.
    ///
    /// Returns `Ok(None)` when the model cannot identify a product (sentinel
    /// reply or empty text); transport and API failures are errors.
    async fn describe_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
        prompt: &str,
        model: &str,
    ) -> Result<Option<String>>;

    /// Opens a fresh conversation with an empty history.
    fn open_conversation(&self, model: &str) -> Arc<dyn Conversation>;
}
