//! Client seam for the external RAG engine.
//!
//! docchat owns no retrieval, indexing, or embedding logic. Everything
//! between "here is some text" and "here is an answer" happens inside an
//! external engine reached over HTTP (a LightRAG-compatible API server),
//! which in turn calls the LLM provider with the user's API key.
//!
//! [`RagEngine`] is the seam the rest of the crate programs against;
//! [`HttpRagEngine`] is the production implementation. Tests substitute
//! their own recording implementations.
//!
//! # Wire contract
//!
//! | Method | Path | Body | Returns |
//! |--------|------|------|---------|
//! | `POST` | `/documents/text` | `{"text", "file_source"}` | 2xx on success |
//! | `POST` | `/query` | `{"query", "mode"}` | `{"response": "..."}` |
//! | `GET`  | `/health` | — | 2xx when ready |
//!
//! The user's API key travels as a bearer `Authorization` header on every
//! call; the engine forwards it to the model provider. A 401/403 from the
//! engine is the authentication failure the UI reports. Exactly one HTTP
//! request is made per user action — no retries, no backoff.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::models::QueryMode;

/// Failure surfaced by the engine or the transport to it.
#[derive(Debug)]
pub enum EngineError {
    /// The engine (or the LLM provider behind it) rejected the credential.
    Authentication(String),
    /// The engine returned a non-success status.
    Api { status: u16, message: String },
    /// The engine answered with a body this client cannot interpret.
    Invalid(String),
    /// Transport-level failure (connect, timeout, TLS).
    Network(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Authentication(m) => write!(f, "authentication failed: {}", m),
            EngineError::Api { status, message } => {
                write!(f, "engine error {}: {}", status, message)
            }
            EngineError::Invalid(m) => write!(f, "invalid engine response: {}", m),
            EngineError::Network(m) => write!(f, "engine unreachable: {}", m),
        }
    }
}

impl std::error::Error for EngineError {}

/// The external engine's ingest/query surface.
#[async_trait]
pub trait RagEngine: Send + Sync {
    /// Short label for logs and the health endpoint.
    fn name(&self) -> &str;

    /// Whether the engine is reachable and ready.
    async fn health(&self) -> Result<bool, EngineError>;

    /// Submits extracted document text for indexing. The key is optional
    /// here: the engine only needs it once it starts embedding.
    async fn ingest_text(
        &self,
        api_key: Option<&str>,
        text: &str,
        source_name: &str,
    ) -> Result<(), EngineError>;

    /// Asks a question with the given mode and returns the answer text.
    async fn query(
        &self,
        api_key: &str,
        question: &str,
        mode: QueryMode,
    ) -> Result<String, EngineError>;
}

// ============ HTTP implementation ============

#[derive(Serialize)]
struct IngestRequest<'a> {
    text: &'a str,
    file_source: &'a str,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    mode: QueryMode,
}

#[derive(Deserialize)]
struct QueryResponse {
    response: String,
}

/// Client for a LightRAG-compatible engine API.
pub struct HttpRagEngine {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRagEngine {
    pub fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Applies the bearer header when a key is present.
    fn authorize(
        &self,
        req: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }
}

/// Maps an HTTP response status to the typed error, reading the body for
/// the message. 401/403 become [`EngineError::Authentication`].
async fn classify_status(response: reqwest::Response) -> EngineError {
    let status = response.status();
    let message = response.text().await.unwrap_or_default();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        EngineError::Authentication(if message.is_empty() {
            status.to_string()
        } else {
            message
        })
    } else {
        EngineError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl RagEngine for HttpRagEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn health(&self) -> Result<bool, EngineError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn ingest_text(
        &self,
        api_key: Option<&str>,
        text: &str,
        source_name: &str,
    ) -> Result<(), EngineError> {
        let body = IngestRequest {
            text,
            file_source: source_name,
        };

        let response = self
            .authorize(self.client.post(self.url("/documents/text")), api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response).await);
        }

        Ok(())
    }

    async fn query(
        &self,
        api_key: &str,
        question: &str,
        mode: QueryMode,
    ) -> Result<String, EngineError> {
        let body = QueryRequest {
            query: question,
            mode,
        };

        let response = self
            .authorize(self.client.post(self.url("/query")), Some(api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_status(response).await);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Invalid(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let engine = HttpRagEngine::new(&EngineConfig {
            base_url: "http://localhost:9621/".to_string(),
            ..EngineConfig::default()
        })
        .unwrap();
        assert_eq!(engine.url("/query"), "http://localhost:9621/query");
    }

    #[test]
    fn query_mode_serializes_into_request_body() {
        let body = QueryRequest {
            query: "what is this about?",
            mode: QueryMode::Global,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "global");
        assert_eq!(json["query"], "what is this about?");
    }
}
