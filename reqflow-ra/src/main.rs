//! reqflow-ra - Requirement Analysis Service
//!
//! Accepts conversational feedback rounds, runs generative requirement
//! analysis in the background, and serves polling clients the state of each
//! round until the requirement document converges.

use anyhow::Result;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reqflow_common::config::ServiceConfig;
use reqflow_ra::services::ai_client::AiBuilderClient;
use reqflow_ra::services::orchestrator::RetrySettings;
use reqflow_ra::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting reqflow-ra (Requirement Analysis) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::resolve();

    let token = config.gateway_token.clone().ok_or_else(|| {
        anyhow::anyhow!("AI_BUILDER_TOKEN environment variable is required")
    })?;

    let gateway = AiBuilderClient::new(
        config.gateway_url.clone(),
        token,
        config.gateway_model.clone(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize gateway client: {}", e))?;

    info!(model = %config.gateway_model, "Inference gateway initialized");

    let retry = RetrySettings {
        max_retries: config.max_retries,
        initial_delay: config.initial_backoff,
    };
    let state = AppState::new(Arc::new(gateway), retry);

    // Build router; static frontend assets are served as the fallback so
    // API routes keep precedence
    let mut app = reqflow_ra::build_router(state);
    if let Some(static_dir) = &config.static_dir {
        if static_dir.is_dir() {
            info!("Serving static assets from {}", static_dir.display());
            app = app.fallback_service(ServeDir::new(static_dir));
        } else {
            tracing::warn!(
                "Static asset directory {} not found, skipping",
                static_dir.display()
            );
        }
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
