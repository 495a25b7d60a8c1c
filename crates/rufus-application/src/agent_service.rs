//! Use-case layer composing the catalog, prompts, gateway and sessions.

use crate::prompts;
use minijinja::context;
use rufus_core::catalog::{CatalogStore, Product};
use rufus_core::error::{Result, RufusError};
use rufus_core::gateway::LlmGateway;
use rufus_core::prompt::format_products;
use rufus_core::recommend::resolve;
use rufus_core::session::SessionRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const EMPTY_CATALOG_MESSAGE: &str =
    "Rufus: I'm sorry, but our product catalog seems to be empty at the moment.";
const UNIDENTIFIED_IMAGE_MESSAGE: &str =
    "Rufus: I'm sorry, I couldn't clearly identify a product in the image you sent.";
const UNSPECIFIED_PROFILE: &str = "not specified";

/// Tunables for the agent: model names per call site, prompt templates and
/// the fallback user profile.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub chat_model: String,
    pub text_recommendation_model: String,
    pub image_description_model: String,
    pub persona_template: String,
    pub text_recommendation_template: String,
    pub image_to_text_prompt: String,
    pub recommendation_from_image_template: String,
    pub default_user_profile: BTreeMap<String, String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            chat_model: DEFAULT_MODEL.to_string(),
            text_recommendation_model: DEFAULT_MODEL.to_string(),
            image_description_model: DEFAULT_MODEL.to_string(),
            persona_template: prompts::PERSONA_TEMPLATE.to_string(),
            text_recommendation_template: prompts::TEXT_RECOMMENDATION_TEMPLATE.to_string(),
            image_to_text_prompt: prompts::IMAGE_TO_TEXT_PROMPT.to_string(),
            recommendation_from_image_template: prompts::RECOMMENDATION_FROM_IMAGE_TEMPLATE
                .to_string(),
            default_user_profile: BTreeMap::from([(
                "profile".to_string(),
                "valued customer".to_string(),
            )]),
        }
    }
}

/// Response payload of a freshly started session.
#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session_id: String,
    pub initial_message: String,
}

/// Response payload shared by both recommendation flows.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReply {
    pub recommendations: Vec<Product>,
    pub message: String,
}

impl RecommendationReply {
    fn without_products(message: &str) -> Self {
        Self {
            recommendations: Vec::new(),
            message: message.to_string(),
        }
    }
}

/// The Rufus agent: everything the HTTP layer needs, behind one owned value.
///
/// Holds the read-only catalog, the session registry and the gateway trait
/// object; constructed once at startup and shared via `Arc`.
pub struct AgentService {
    gateway: Arc<dyn LlmGateway>,
    catalog: Arc<CatalogStore>,
    sessions: SessionRegistry,
    settings: AgentSettings,
}

impl AgentService {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        catalog: Arc<CatalogStore>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            gateway,
            catalog,
            sessions: SessionRegistry::new(),
            settings,
        }
    }

    /// Starts a new chat session.
    ///
    /// Renders the persona prompt with the user profile (falling back to the
    /// configured default profile when the payload carries none), issues it
    /// as the first turn, and registers the conversation under a fresh id.
    ///
    /// # Errors
    ///
    /// Upstream errors from the first turn propagate; no session is
    /// registered in that case.
    pub async fn start_session(
        &self,
        user_info: Option<BTreeMap<String, String>>,
    ) -> Result<StartedSession> {
        let profile = user_info.unwrap_or_else(|| self.settings.default_user_profile.clone());
        let profile_details = render_profile(&profile);

        let prompt = prompts::render(
            &self.settings.persona_template,
            context! { user_profile_details => profile_details },
        )?;

        let conversation = self.gateway.open_conversation(&self.settings.chat_model);
        let greeting = conversation.send(&prompt).await?;

        let session_id = Uuid::new_v4().to_string();
        self.sessions.register(session_id.clone(), conversation).await;
        tracing::info!(
            "Session {} started ({} live sessions)",
            session_id,
            self.sessions.len().await
        );

        Ok(StartedSession {
            session_id,
            initial_message: greeting,
        })
    }

    /// Forwards one message to an existing session and returns the reply.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown id; upstream errors propagate.
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String> {
        let conversation = self.sessions.get(session_id).await?;
        conversation.send(message).await
    }

    /// Recommends products for a textual query.
    ///
    /// An empty catalog short-circuits to an apology without touching the
    /// gateway.
    pub async fn recommend_text(&self, query: &str) -> Result<RecommendationReply> {
        if self.catalog.is_empty() {
            tracing::warn!("Product catalog is empty; skipping text recommendation");
            return Ok(RecommendationReply::without_products(EMPTY_CATALOG_MESSAGE));
        }

        let product_context = format_products(self.catalog.all(), None);
        let prompt = prompts::render(
            &self.settings.text_recommendation_template,
            context! { user_query => query, product_context => product_context },
        )?;

        let reply_text = self
            .gateway
            .complete_text(&prompt, &self.settings.text_recommendation_model)
            .await?;
        tracing::info!("Model reply for text recommendation: '{}'", reply_text);

        let outcome = resolve(&reply_text, &self.catalog);
        Ok(RecommendationReply {
            message: format!(
                "Rufus: Okay, for your query '{}', I've looked through our products.{}",
                query, outcome.status_fragment
            ),
            recommendations: outcome.products,
        })
    }

    /// Recommends products similar to an uploaded image.
    ///
    /// Two gateway calls: the vision model describes the image, then the
    /// text model picks ids from that description. The empty-catalog check
    /// runs before anything else, and an empty upload is rejected before the
    /// first gateway call.
    pub async fn recommend_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<RecommendationReply> {
        if self.catalog.is_empty() {
            tracing::warn!("Product catalog is empty; skipping image recommendation");
            return Ok(RecommendationReply::without_products(EMPTY_CATALOG_MESSAGE));
        }
        if bytes.is_empty() {
            return Err(RufusError::EmptyUpload);
        }

        let description = match self
            .gateway
            .describe_image(
                bytes,
                mime_type,
                &self.settings.image_to_text_prompt,
                &self.settings.image_description_model,
            )
            .await?
        {
            Some(description) => description,
            None => {
                tracing::info!("Vision model could not identify a product in the upload");
                return Ok(RecommendationReply::without_products(
                    UNIDENTIFIED_IMAGE_MESSAGE,
                ));
            }
        };
        tracing::info!("Vision model described the image as '{}'", description);

        let product_context = format_products(self.catalog.all(), None);
        let prompt = prompts::render(
            &self.settings.recommendation_from_image_template,
            context! { image_description => &description, product_context => product_context },
        )?;

        let reply_text = self
            .gateway
            .complete_text(&prompt, &self.settings.text_recommendation_model)
            .await?;
        tracing::info!("Model reply for image recommendation: '{}'", reply_text);

        let outcome = resolve(&reply_text, &self.catalog);
        Ok(RecommendationReply {
            message: format!(
                "Rufus: Based on the image (which I see as about '{}'),{}",
                description, outcome.status_fragment
            ),
            recommendations: outcome.products,
        })
    }

    /// Drops all live sessions. Called once at process shutdown.
    pub async fn shutdown(&self) {
        let dropped = self.sessions.clear().await;
        tracing::info!("Session store cleared ({} sessions dropped)", dropped);
    }
}

/// Renders a profile map as comma-joined `key: value` pairs, or the literal
/// `not specified` for an empty map.
fn render_profile(profile: &BTreeMap<String, String>) -> String {
    if profile.is_empty() {
        return UNSPECIFIED_PROFILE.to_string();
    }
    profile
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rufus_core::gateway::Conversation;
    use serde_json::json;
    use std::sync::Mutex;

    fn catalog() -> Arc<CatalogStore> {
        Arc::new(CatalogStore::from_records(vec![
            json!({
                "id": "p1",
                "name": "Red Shirt",
                "description": "A bright red cotton shirt",
                "price": 19.99,
                "image_url": "/images/p1.jpg",
                "category": "apparel",
                "tags": ["red", "shirt"]
            }),
            json!({
                "id": "p2",
                "name": "Blue Mug",
                "description": "A ceramic mug",
                "price": 7.5,
                "image_url": "/images/p2.jpg",
                "category": "kitchen",
                "tags": ["blue"]
            }),
        ]))
    }

    struct MockConversation {
        reply: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Conversation for MockConversation {
        async fn send(&self, message: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(message.to_string());
            Ok(self.reply.clone())
        }
    }

    /// Scripted gateway that records every call it sees.
    #[derive(Default)]
    struct MockGateway {
        completion_reply: Option<String>,
        description_reply: Option<String>,
        conversation_reply: String,
        completion_prompts: Mutex<Vec<String>>,
        description_calls: Mutex<usize>,
        conversation_prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn complete_text(&self, prompt: &str, _model: &str) -> Result<String> {
            self.completion_prompts.lock().unwrap().push(prompt.to_string());
            match &self.completion_reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(RufusError::upstream("no completion scripted")),
            }
        }

        async fn describe_image(
            &self,
            _bytes: &[u8],
            _mime_type: &str,
            _prompt: &str,
            _model: &str,
        ) -> Result<Option<String>> {
            *self.description_calls.lock().unwrap() += 1;
            Ok(self.description_reply.clone())
        }

        fn open_conversation(&self, _model: &str) -> Arc<dyn Conversation> {
            Arc::new(MockConversation {
                reply: self.conversation_reply.clone(),
                prompts: self.conversation_prompts.clone(),
            })
        }
    }

    fn service_with(gateway: MockGateway, catalog: Arc<CatalogStore>) -> (AgentService, Arc<MockGateway>) {
        let gateway = Arc::new(gateway);
        let service = AgentService::new(gateway.clone(), catalog, AgentSettings::default());
        (service, gateway)
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let (service, _) = service_with(
            MockGateway {
                conversation_reply: "Hi, I'm Rufus!".to_string(),
                ..MockGateway::default()
            },
            catalog(),
        );

        let started = service.start_session(None).await.unwrap();
        assert!(!started.session_id.is_empty());
        assert_eq!(started.initial_message, "Hi, I'm Rufus!");

        let reply = service.chat(&started.session_id, "hi").await.unwrap();
        assert_eq!(reply, "Hi, I'm Rufus!");

        let err = service.chat("bogus-id", "hi").await.unwrap_err();
        assert!(err.is_session_not_found());
    }

    #[tokio::test]
    async fn test_start_session_seeds_persona_with_default_profile() {
        let (service, gateway) = service_with(
            MockGateway {
                conversation_reply: "hello".to_string(),
                ..MockGateway::default()
            },
            catalog(),
        );

        service.start_session(None).await.unwrap();

        let prompts = gateway.conversation_prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("profile: valued customer"));
        assert!(prompts[0].contains("Your name is Rufus."));
    }

    #[tokio::test]
    async fn test_start_session_with_empty_profile_says_not_specified() {
        let (service, gateway) = service_with(
            MockGateway {
                conversation_reply: "hello".to_string(),
                ..MockGateway::default()
            },
            catalog(),
        );

        service.start_session(Some(BTreeMap::new())).await.unwrap();

        let prompts = gateway.conversation_prompts.lock().unwrap();
        assert!(prompts[0].contains("following profile: not specified."));
    }

    #[tokio::test]
    async fn test_recommend_text_resolves_known_ids() {
        let (service, gateway) = service_with(
            MockGateway {
                completion_reply: Some("p1,p3".to_string()),
                ..MockGateway::default()
            },
            catalog(),
        );

        let reply = service.recommend_text("something red").await.unwrap();

        assert_eq!(reply.recommendations.len(), 1);
        assert_eq!(reply.recommendations[0].id, "p1");
        assert_eq!(
            reply.message,
            "Rufus: Okay, for your query 'something red', I've looked through our products. here are some recommendations:"
        );

        // The prompt carried the full catalog context.
        let prompts = gateway.completion_prompts.lock().unwrap();
        assert!(prompts[0].contains("ID: p1, Name: Red Shirt"));
        assert!(prompts[0].contains("ID: p2, Name: Blue Mug"));
    }

    #[tokio::test]
    async fn test_recommend_text_empty_catalog_skips_gateway() {
        let (service, gateway) = service_with(
            MockGateway::default(),
            Arc::new(CatalogStore::empty()),
        );

        let reply = service.recommend_text("anything").await.unwrap();

        assert!(reply.recommendations.is_empty());
        assert_eq!(reply.message, EMPTY_CATALOG_MESSAGE);
        assert!(gateway.completion_prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_image_empty_upload_is_rejected_before_gateway() {
        let (service, gateway) = service_with(MockGateway::default(), catalog());

        let err = service.recommend_image(&[], "image/png").await.unwrap_err();

        assert!(matches!(err, RufusError::EmptyUpload));
        assert_eq!(*gateway.description_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recommend_image_unidentified_product_apologizes() {
        let (service, gateway) = service_with(
            MockGateway {
                description_reply: None,
                ..MockGateway::default()
            },
            catalog(),
        );

        let reply = service
            .recommend_image(&[1, 2, 3], "image/png")
            .await
            .unwrap();

        assert!(reply.recommendations.is_empty());
        assert_eq!(reply.message, UNIDENTIFIED_IMAGE_MESSAGE);
        assert_eq!(*gateway.description_calls.lock().unwrap(), 1);
        assert!(gateway.completion_prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_image_full_flow() {
        let (service, gateway) = service_with(
            MockGateway {
                description_reply: Some("red cotton shirt".to_string()),
                completion_reply: Some("p1".to_string()),
                ..MockGateway::default()
            },
            catalog(),
        );

        let reply = service
            .recommend_image(&[1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        assert_eq!(reply.recommendations.len(), 1);
        assert_eq!(reply.recommendations[0].name, "Red Shirt");
        assert_eq!(
            reply.message,
            "Rufus: Based on the image (which I see as about 'red cotton shirt'), here are some recommendations:"
        );

        let prompts = gateway.completion_prompts.lock().unwrap();
        assert!(prompts[0].contains("described the main product in an image as: \"red cotton shirt\""));
    }

    #[tokio::test]
    async fn test_shutdown_clears_sessions() {
        let (service, _) = service_with(
            MockGateway {
                conversation_reply: "hello".to_string(),
                ..MockGateway::default()
            },
            catalog(),
        );

        let started = service.start_session(None).await.unwrap();
        service.shutdown().await;

        let err = service.chat(&started.session_id, "hi").await.unwrap_err();
        assert!(err.is_session_not_found());
    }

    #[test]
    fn test_render_profile_joins_pairs() {
        let profile = BTreeMap::from([
            ("age".to_string(), "30".to_string()),
            ("name".to_string(), "Alice".to_string()),
        ]);

        assert_eq!(render_profile(&profile), "age: 30, name: Alice");
        assert_eq!(render_profile(&BTreeMap::new()), "not specified");
    }
}
