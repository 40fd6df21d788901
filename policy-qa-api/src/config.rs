//! Server configuration read from the environment

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use policy_qa_storage::file::DEFAULT_RULES_PATH;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Location of the extracted rule file
    pub rules_path: PathBuf,
    /// Bearer token for authenticated routes; unset rejects every request
    pub api_key: Option<String>,
    /// Retrieval service used when no rule matches
    pub rag_endpoint: Option<String>,
    pub rag_timeout: Duration,
    /// Extraction service consulted for low-confidence questions
    pub extractor_endpoint: Option<String>,
    pub extractor_timeout: Duration,
    /// Extractions below this confidence are escalated
    pub confidence_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            api_key: None,
            rag_endpoint: None,
            rag_timeout: Duration::from_secs(30),
            extractor_endpoint: None,
            extractor_timeout: Duration::from_secs(30),
            confidence_threshold: 0.8,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rules_path", &self.rules_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rag_endpoint", &self.rag_endpoint)
            .field("rag_timeout", &self.rag_timeout)
            .field("extractor_endpoint", &self.extractor_endpoint)
            .field("extractor_timeout", &self.extractor_timeout)
            .field("confidence_threshold", &self.confidence_threshold)
            .finish()
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `RULES_PATH`, `API_KEY`, `RAG_ENDPOINT`,
    /// `RAG_TIMEOUT_SECS`, `EXTRACTOR_ENDPOINT`, `EXTRACTOR_TIMEOUT_SECS`
    /// and `CONFIDENCE_THRESHOLD`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(path) = get("RULES_PATH") {
            config.rules_path = PathBuf::from(path);
        }
        config.api_key = get("API_KEY");
        config.rag_endpoint = get("RAG_ENDPOINT");
        if let Some(secs) = get("RAG_TIMEOUT_SECS") {
            config.rag_timeout = Duration::from_secs(parse("RAG_TIMEOUT_SECS", &secs)?);
        }
        config.extractor_endpoint = get("EXTRACTOR_ENDPOINT");
        if let Some(secs) = get("EXTRACTOR_TIMEOUT_SECS") {
            config.extractor_timeout = Duration::from_secs(parse("EXTRACTOR_TIMEOUT_SECS", &secs)?);
        }
        if let Some(threshold) = get("CONFIDENCE_THRESHOLD") {
            let value: f64 = parse("CONFIDENCE_THRESHOLD", &threshold)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: "CONFIDENCE_THRESHOLD",
                    value: threshold,
                    reason: "must be between 0 and 1".to_string(),
                });
            }
            config.confidence_threshold = value;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
