//! In-memory registry binding session ids to live conversations.

use crate::error::{Result, RufusError};
use crate::gateway::Conversation;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maps opaque session ids to their conversation handles.
///
/// The registry is a cheap cloneable handle over shared state, meant to be
/// passed into whatever owns request handling rather than living in a global.
/// Sessions have no expiry; they are dropped all at once by [`clear`] at
/// process shutdown.
///
/// [`clear`]: SessionRegistry::clear
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<dyn Conversation>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a conversation under a session id.
    pub async fn register(&self, session_id: String, conversation: Arc<dyn Conversation>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, conversation);
    }

    /// Returns the conversation for a session id.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` when the id was never registered (or already
    /// cleared).
    pub async fn get(&self, session_id: &str) -> Result<Arc<dyn Conversation>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| RufusError::session_not_found(session_id))
    }

    /// Drops every session, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let dropped = sessions.len();
        sessions.clear();
        dropped
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoConversation;

    #[async_trait]
    impl Conversation for EchoConversation {
        async fn send(&self, message: &str) -> Result<String> {
            Ok(format!("echo: {message}"))
        }
    }

    #[tokio::test]
    async fn test_register_and_get_round_trip() {
        let registry = SessionRegistry::new();
        registry
            .register("session-1".to_string(), Arc::new(EchoConversation))
            .await;

        let conversation = registry.get("session-1").await.unwrap();
        assert_eq!(conversation.send("hi").await.unwrap(), "echo: hi");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_session_fails() {
        let registry = SessionRegistry::new();

        let err = registry.get("missing").await.unwrap_err();
        assert!(err.is_session_not_found());
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let registry = SessionRegistry::new();
        registry
            .register("a".to_string(), Arc::new(EchoConversation))
            .await;
        registry
            .register("b".to_string(), Arc::new(EchoConversation))
            .await;

        assert_eq!(registry.clear().await, 2);
        assert_eq!(registry.len().await, 0);
        assert!(registry.get("a").await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let registry = SessionRegistry::new();
        let other = registry.clone();
        registry
            .register("shared".to_string(), Arc::new(EchoConversation))
            .await;

        assert!(other.get("shared").await.is_ok());
    }
}
