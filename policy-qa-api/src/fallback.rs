//! Retrieval fallback used when no rule matches

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::OrchestratorError;

/// Answer given when no rule matches and no retrieval service is configured
pub const NO_RULE_ANSWER: &str =
    "No policy rule matched this question and document retrieval is not configured.";

/// Answers a question from the policy document itself
#[async_trait]
pub trait AnswerFallback: Send + Sync {
    async fn answer(&self, documents: &str, question: &str) -> Result<String, OrchestratorError>;
}

/// Fallback for deployments without a retrieval service
pub struct UnavailableFallback;

#[async_trait]
impl AnswerFallback for UnavailableFallback {
    async fn answer(&self, _documents: &str, _question: &str) -> Result<String, OrchestratorError> {
        Ok(NO_RULE_ANSWER.to_string())
    }
}

#[derive(Serialize)]
struct RagQuery<'a> {
    documents: &'a str,
    question: &'a str,
}

/// Delegates to an external retrieval-augmented answering service over HTTP
pub struct HttpRagFallback {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRagFallback {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OrchestratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Fallback(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnswerFallback for HttpRagFallback {
    async fn answer(&self, documents: &str, question: &str) -> Result<String, OrchestratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RagQuery { documents, question })
            .send()
            .await
            .map_err(|e| OrchestratorError::Fallback(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(100).collect();
            return Err(OrchestratorError::Fallback(format!(
                "RAG service returned {}: {}",
                status, snippet
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OrchestratorError::Fallback(format!("Invalid RAG response: {}", e)))?;

        Ok(answer_text(body))
    }
}

/// Pull the answer out of a RAG reply: `answer`, then `justification`,
/// otherwise the whole reply as text
fn answer_text(body: Value) -> String {
    match body {
        Value::String(answer) => answer,
        Value::Object(ref map) => map
            .get("answer")
            .or_else(|| map.get("justification"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        other => other.to_string(),
    }
}
