use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use mtf_core::{CoreConfig, LlmBackend};

/// Main entry point for the MTF scan service
///
/// Resolves configuration once, chooses the LLM backend, and serves the REST API with
/// OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `MTF_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `OPENAI_API_KEY`: LLM credential
/// - `MTF_LLM_BASE_URL`: OpenAI-compatible base URL (default: "https://api.openai.com/v1")
/// - `MTF_LLM_MODEL`: chat model (default: "gpt-4o")
/// - `MTF_LLM_TIMEOUT_SECS`: per-request LLM timeout (default: 60)
/// - `MTF_ALLOW_MOCK_LLM`: serve fixed mock results when no credential is set (default: false)
///
/// # Errors
/// Returns an error if:
/// - configuration is invalid, or no credential is set and mock mode is not allowed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mtf_run=info".parse()?)
                .add_directive("mtf_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MTF_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::debug!(?cfg, "configuration resolved");
    let backend = LlmBackend::from_config(&cfg)?;

    let app = router(AppState::new(backend));

    tracing::info!("++ Starting MTF REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("-- Shutting down MTF REST");
}
