//! Application state for the RAG server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::Answerer;
use crate::ingestion::Ingestor;
use crate::providers::{ProviderSet, VectorIndex};
use crate::retrieval::Retriever;

/// Shared application state
///
/// The pipeline components are wired once at startup from explicit
/// dependencies; request handlers only ever see this state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    ingestor: Ingestor,
    answerer: Answerer,
    index: Arc<dyn VectorIndex>,
    ready: RwLock<bool>,
}

impl AppState {
    /// Wire the pipeline from a provider set and a vector index
    pub fn new(
        config: RagConfig,
        providers: ProviderSet,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        let ingestor = Ingestor::new(
            &config.chunking,
            config.ingest.clone(),
            Arc::clone(&providers.embedder),
            Arc::clone(&index),
            &config.timeouts,
        )?;

        let retriever = Arc::new(Retriever::new(
            providers.embedder,
            Arc::clone(&index),
            &config.ask,
            &config.timeouts,
        ));

        let answerer = Answerer::new(
            retriever,
            providers.chat,
            config.ask.clone(),
            &config.timeouts,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                ingestor,
                answerer,
                index,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the ingest pipeline
    pub fn ingestor(&self) -> &Ingestor {
        &self.inner.ingestor
    }

    /// Get the ask pipeline
    pub fn answerer(&self) -> &Answerer {
        &self.inner.answerer
    }

    /// Get the vector index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
