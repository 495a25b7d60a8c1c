//! Use-case layer for the Rufus agent.

mod agent_service;
pub mod prompts;

pub use agent_service::{AgentService, AgentSettings, RecommendationReply, StartedSession};
