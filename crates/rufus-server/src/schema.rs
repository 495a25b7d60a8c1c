//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct StartSessionPayload {
    #[serde(default)]
    pub user_info: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRecommendQuery {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_session_payload_user_info_is_optional() {
        let payload: StartSessionPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.user_info.is_none());

        let payload: StartSessionPayload =
            serde_json::from_str(r#"{"user_info": {"name": "Alice"}}"#).unwrap();
        assert_eq!(
            payload.user_info.unwrap().get("name").map(String::as_str),
            Some("Alice")
        );
    }

    #[test]
    fn test_chat_payload_requires_session_id() {
        assert!(serde_json::from_str::<ChatPayload>(r#"{"message": "hi"}"#).is_err());
    }
}
