//! Environment-sourced settings.
//!
//! Everything has a default except the API key; a missing key is reported at
//! startup but does not stop the process (requests will fail upstream
//! instead).

use rufus_application::AgentSettings;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8000);
const DEFAULT_PRODUCTS_PATH: &str = "productinfo/products.json";
const DEFAULT_IMAGES_PATH: &str = "productinfo/images";
const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: String,
    pub bind_addr: SocketAddr,
    pub products_json_path: PathBuf,
    pub product_images_path: PathBuf,
    pub allowed_origins: Vec<String>,
    // Not consulted anywhere yet; conversation histories grow unbounded.
    pub max_history_turns: usize,
    pub agent: AgentSettings,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        let mut agent = AgentSettings::default();
        if let Ok(model) = env::var("CHAT_MODEL_NAME") {
            agent.chat_model = model;
        }
        if let Ok(model) = env::var("TEXT_RECOMMENDATION_MODEL_NAME") {
            agent.text_recommendation_model = model;
        }
        if let Ok(model) = env::var("IMAGE_DESCRIPTION_MODEL_NAME") {
            agent.image_description_model = model;
        }

        Self {
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR)),
            products_json_path: env::var("PRODUCTS_JSON_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PRODUCTS_PATH)),
            product_images_path: env::var("PRODUCT_IMAGES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_IMAGES_PATH)),
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string()),
            ),
            max_history_turns: env::var("MAX_HISTORY_TURNS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(10),
            agent,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_drops_empties() {
        assert_eq!(
            parse_origins(" http://localhost:3000 ,, http://localhost:5173"),
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert!(parse_origins("").is_empty());
    }
}
