//! Gemini-backed implementation of the model gateway.

mod chat;
mod gemini;

pub use chat::GeminiConversation;
pub use gemini::GeminiClient;
