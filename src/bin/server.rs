//! RAG server binary
//!
//! Run with: cargo run --bin runbook-rag-server

use runbook_rag::config::RagConfig;
use runbook_rag::providers;
use runbook_rag::server::{state::AppState, RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runbook_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env();

    tracing::info!("configuration loaded");
    tracing::info!("  - model provider: {:?}", config.model.provider);
    tracing::info!("  - chat model: {}", config.model.chat_model);
    tracing::info!("  - embedding model: {}", config.model.embedding_model);
    tracing::info!("  - embedding dimension: {}", config.model.dimension);
    tracing::info!("  - vector backend: {:?}", config.vector.backend);
    tracing::info!("  - chunk size: {}", config.chunking.chunk_size);

    let model_providers = providers::build_model_providers(&config.model, &config.timeouts)?;
    let index = providers::build_vector_index(
        &config.vector,
        &config.timeouts,
        config.model.dimension,
    )?;

    index.initialize().await?;
    tracing::info!("vector index '{}' ready", index.name());

    let state = AppState::new(config, model_providers, index)?;
    let server = RagServer::new(state);

    tracing::info!("listening on http://{}", server.address());
    server.start().await?;

    Ok(())
}
