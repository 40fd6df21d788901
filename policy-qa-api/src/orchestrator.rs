//! Per-question pipeline: extract facts, match rules, fall back to retrieval

use futures::future::join_all;
use policy_qa_core::{Decision, FactRecord, MatchOutcome};
use policy_qa_matcher::evaluate;
use policy_qa_storage::RuleStore;
use std::sync::Arc;

use crate::extractor::FactExtractor;
use crate::fallback::AnswerFallback;
use crate::OrchestratorError;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Where an answer came from
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    Rule(Decision),
    Fallback,
    Failed,
}

#[derive(Debug, Clone)]
pub struct QuestionOutcome {
    pub answer: String,
    pub source: AnswerSource,
}

pub struct Orchestrator {
    store: RuleStore,
    extractor: Arc<dyn FactExtractor>,
    escalation: Option<Arc<dyn FactExtractor>>,
    fallback: Arc<dyn AnswerFallback>,
    confidence_threshold: f64,
}

impl Orchestrator {
    pub fn new(
        store: RuleStore,
        extractor: Arc<dyn FactExtractor>,
        fallback: Arc<dyn AnswerFallback>,
    ) -> Self {
        Self {
            store,
            extractor,
            escalation: None,
            fallback,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Extractor consulted when the primary extraction is not confident enough
    pub fn with_escalation(mut self, escalation: Arc<dyn FactExtractor>) -> Self {
        self.escalation = Some(escalation);
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Primary extraction, escalated when its confidence is below the threshold.
    /// Records without a confidence score are trusted as-is.
    pub async fn extract_facts(&self, question: &str) -> Result<FactRecord, OrchestratorError> {
        let facts = self.extractor.extract(question).await?;

        match (facts.confidence(), &self.escalation) {
            (Some(confidence), Some(escalation)) if confidence < self.confidence_threshold => {
                tracing::info!("Low extraction confidence {:.2}, escalating", confidence);
                escalation.extract(question).await
            }
            (Some(confidence), None) if confidence < self.confidence_threshold => {
                tracing::debug!(
                    "Low extraction confidence {:.2}, no escalation extractor configured",
                    confidence
                );
                Ok(facts)
            }
            _ => Ok(facts),
        }
    }

    /// Answer one question. Errors are contained in the returned outcome.
    pub async fn answer_question(&self, documents: &str, question: &str) -> QuestionOutcome {
        match self.try_answer(documents, question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to answer question {:?}: {}", question, e);
                QuestionOutcome {
                    answer: format!("Internal error: {}", e),
                    source: AnswerSource::Failed,
                }
            }
        }
    }

    /// Answer every question concurrently; outcomes keep question order
    pub async fn answer_all(&self, documents: &str, questions: &[String]) -> Vec<QuestionOutcome> {
        join_all(questions.iter().map(|q| self.answer_question(documents, q))).await
    }

    async fn try_answer(
        &self,
        documents: &str,
        question: &str,
    ) -> Result<QuestionOutcome, OrchestratorError> {
        let facts = self.extract_facts(question).await?;
        let rules = self.store.snapshot();

        match evaluate(&facts, rules.rules())? {
            MatchOutcome::Matched(decision) => {
                tracing::debug!("Answered from rule {:?}", decision.citations);
                Ok(QuestionOutcome {
                    answer: decision.justification.clone(),
                    source: AnswerSource::Rule(decision),
                })
            }
            MatchOutcome::NoMatch => {
                let answer = self.fallback.answer(documents, question).await?;
                Ok(QuestionOutcome {
                    answer,
                    source: AnswerSource::Fallback,
                })
            }
        }
    }
}
