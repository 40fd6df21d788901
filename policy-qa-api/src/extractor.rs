//! Fact extraction from free-text questions

use async_trait::async_trait;
use policy_qa_core::{FactRecord, FACT_FIELDS};
use regex::Regex;
use serde::Serialize;
use std::time::Duration;

use crate::OrchestratorError;

pub const DEFAULT_PROCEDURES: [&str; 3] = ["knee surgery", "bypass surgery", "cataract surgery"];
pub const DEFAULT_CITIES: [&str; 4] = ["Pune", "Mumbai", "Delhi", "Bangalore"];

/// Turns a question into a fact record with a confidence score
#[async_trait]
pub trait FactExtractor: Send + Sync {
    async fn extract(&self, question: &str) -> Result<FactRecord, OrchestratorError>;
}

/// Deterministic keyword and pattern extractor.
///
/// Confidence is the share of the five known fields it managed to fill.
pub struct KeywordExtractor {
    procedures: Vec<String>,
    cities: Vec<String>,
    age: Regex,
    policy_months: Regex,
    female: Regex,
    male: Regex,
}

impl KeywordExtractor {
    /// Extractor recognising the given procedures and cities, matched in list order
    pub fn new(procedures: Vec<String>, cities: Vec<String>) -> Result<Self, OrchestratorError> {
        Ok(Self {
            procedures,
            cities,
            age: pattern(r"(?i)(\d{2})[- ]?year[- ]?old")?,
            policy_months: pattern(r"(?i)(issued|started).*?(\d+)\s*(month|mo)")?,
            female: pattern(r"(?i)\bfemale\b")?,
            male: pattern(r"(?i)\bmale\b")?,
        })
    }

    /// Extractor with the built-in procedure and city vocabulary
    pub fn with_defaults() -> Result<Self, OrchestratorError> {
        Self::new(
            DEFAULT_PROCEDURES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_CITIES.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn extract_sync(&self, question: &str) -> FactRecord {
        let lowered = question.to_lowercase();

        let age = self
            .age
            .captures(question)
            .and_then(|c| c[1].parse::<i64>().ok());

        let gender = if self.female.is_match(question) {
            Some("female")
        } else if self.male.is_match(question) {
            Some("male")
        } else {
            None
        };

        let procedure = first_mentioned(&self.procedures, &lowered);
        let city = first_mentioned(&self.cities, &lowered);

        let policy_months = self
            .policy_months
            .captures(question)
            .and_then(|c| c[2].parse::<i64>().ok());

        let record = FactRecord::new()
            .with_optional("age", age)
            .with_optional("gender", gender)
            .with_optional("procedure", procedure)
            .with_optional("city", city)
            .with_optional("policy_months", policy_months);

        let confidence = record.present_count() as f64 / FACT_FIELDS.len() as f64;
        record.with_confidence(confidence)
    }
}

#[async_trait]
impl FactExtractor for KeywordExtractor {
    async fn extract(&self, question: &str) -> Result<FactRecord, OrchestratorError> {
        Ok(self.extract_sync(question))
    }
}

fn pattern(source: &str) -> Result<Regex, OrchestratorError> {
    Regex::new(source).map_err(|e| OrchestratorError::Extraction(format!("Invalid pattern: {}", e)))
}

fn first_mentioned(candidates: &[String], lowered: &str) -> Option<String> {
    candidates
        .iter()
        .find(|c| lowered.contains(&c.to_lowercase()))
        .cloned()
}

#[derive(Serialize)]
struct ExtractionQuery<'a> {
    question: &'a str,
}

/// Re-extracts facts through an external extraction service over HTTP.
///
/// The service answers with a flat fact record, e.g.
/// `{"age": 46, "procedure": "knee surgery", "city": null, "confidence": 0.9}`.
pub struct HttpFactExtractor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFactExtractor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, OrchestratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrchestratorError::Extraction(format!("Failed to build HTTP client: {}", e)))?;

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
impl FactExtractor for HttpFactExtractor {
    async fn extract(&self, question: &str) -> Result<FactRecord, OrchestratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ExtractionQuery { question })
            .send()
            .await
            .map_err(|e| OrchestratorError::Extraction(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(100).collect();
            return Err(OrchestratorError::Extraction(format!(
                "Extraction service returned {}: {}",
                status, snippet
            )));
        }

        response
            .json::<FactRecord>()
            .await
            .map_err(|e| OrchestratorError::Extraction(format!("Invalid extraction response: {}", e)))
    }
}
