use anyhow::Result;
use rufus_application::AgentService;
use rufus_core::catalog::CatalogStore;
use rufus_interaction::GeminiClient;
use rufus_server::config::Settings;
use rufus_server::routes::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();
    if settings.gemini_api_key.is_empty() {
        tracing::error!("GEMINI_API_KEY is not set; model calls will fail until it is provided");
    }

    let catalog = match CatalogStore::load(&settings.products_json_path) {
        Ok(catalog) => {
            tracing::info!(
                "Loaded {} products from {}",
                catalog.len(),
                settings.products_json_path.display()
            );
            catalog
        }
        Err(err) => {
            tracing::warn!("Continuing with an empty catalog: {err}");
            CatalogStore::empty()
        }
    };

    let gateway = Arc::new(GeminiClient::new(settings.gemini_api_key.clone()));
    let service = Arc::new(AgentService::new(
        gateway,
        Arc::new(catalog),
        settings.agent.clone(),
    ));

    let app = rufus_server::build_router(
        AppState {
            service: service.clone(),
        },
        &settings.allowed_origins,
        &settings.product_images_path,
    );

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("Rufus listening on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("Shutdown requested");
}
