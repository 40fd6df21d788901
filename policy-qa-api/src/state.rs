//! Application state shared across handlers

use policy_qa_storage::{JsonFileSource, RuleStore};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::extractor::{HttpFactExtractor, KeywordExtractor};
use crate::fallback::{AnswerFallback, HttpRagFallback, UnavailableFallback};
use crate::orchestrator::Orchestrator;
use crate::OrchestratorError;

/// Shared application state
pub struct AppState {
    pub store: RuleStore,
    pub orchestrator: Orchestrator,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, api_key: Option<String>) -> Self {
        Self {
            store: orchestrator.store().clone(),
            orchestrator,
            api_key,
        }
    }

    /// Keyword extraction and no retrieval service; for development and tests
    pub fn with_store(store: RuleStore, api_key: Option<String>) -> Result<Self, OrchestratorError> {
        let orchestrator = Orchestrator::new(
            store,
            Arc::new(KeywordExtractor::with_defaults()?),
            Arc::new(UnavailableFallback),
        );
        Ok(Self::new(orchestrator, api_key))
    }

    /// Load rules from the configured file and wire the answer pipeline
    pub async fn from_config(config: &ServerConfig) -> Result<Self, OrchestratorError> {
        let source = Arc::new(JsonFileSource::new(&config.rules_path));
        let store = RuleStore::open(source).await;

        let fallback: Arc<dyn AnswerFallback> = match &config.rag_endpoint {
            Some(endpoint) => {
                tracing::info!("Using retrieval service at {}", endpoint);
                Arc::new(HttpRagFallback::new(endpoint.clone(), config.rag_timeout)?)
            }
            None => {
                tracing::warn!("RAG_ENDPOINT not set, unmatched questions get a fixed answer");
                Arc::new(UnavailableFallback)
            }
        };

        if config.api_key.is_none() {
            tracing::warn!("API_KEY not set, authenticated routes will reject every request");
        }

        let mut orchestrator =
            Orchestrator::new(store, Arc::new(KeywordExtractor::with_defaults()?), fallback)
                .with_confidence_threshold(config.confidence_threshold);

        match &config.extractor_endpoint {
            Some(endpoint) => {
                tracing::info!(
                    "Escalating extractions below {:.2} confidence to {}",
                    config.confidence_threshold,
                    endpoint
                );
                let escalation = HttpFactExtractor::new(endpoint.clone(), config.extractor_timeout)?;
                orchestrator = orchestrator.with_escalation(Arc::new(escalation));
            }
            None => {
                tracing::info!("EXTRACTOR_ENDPOINT not set, keyword extraction only");
            }
        }

        Ok(Self::new(orchestrator, config.api_key.clone()))
    }
}
