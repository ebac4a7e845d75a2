//! Query dispatch: preconditions, one engine call, one chat turn.
//!
//! The dispatcher makes exactly one engine call per user action — no retry,
//! no backoff. All preconditions (non-empty question, API key present,
//! something ingested) are checked before the network is touched, so a
//! failed precondition never appends to the chat history.

use chrono::Utc;

use crate::config::Config;
use crate::engine::{EngineError, RagEngine};
use crate::models::{ChatTurn, QueryMode};
use crate::session::Session;

/// Why a question could not be answered.
#[derive(Debug)]
pub enum ChatError {
    EmptyQuestion,
    /// No key configured, or the upstream API rejected the one provided.
    Authentication(String),
    /// No documents have been ingested yet.
    EmptyIndex,
    Engine(EngineError),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::EmptyQuestion => write!(f, "question must not be empty"),
            ChatError::Authentication(m) => write!(f, "authentication failed: {}", m),
            ChatError::EmptyIndex => {
                write!(f, "no documents ingested yet — upload documents first")
            }
            ChatError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<EngineError> for ChatError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Authentication(m) => ChatError::Authentication(m),
            other => ChatError::Engine(other),
        }
    }
}

/// Dispatches one question to the engine and appends the resulting turn.
///
/// Mode resolution: the explicit override wins, otherwise the session's
/// selected mode. On any error the chat history is left untouched.
pub async fn dispatch_query(
    engine: &dyn RagEngine,
    session: &mut Session,
    question: &str,
    mode_override: Option<QueryMode>,
) -> Result<ChatTurn, ChatError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ChatError::EmptyQuestion);
    }

    let api_key = session
        .api_key()
        .ok_or_else(|| ChatError::Authentication("no API key configured".to_string()))?
        .to_string();

    if session.documents().is_empty() {
        return Err(ChatError::EmptyIndex);
    }

    let mode = mode_override.unwrap_or_else(|| session.mode());
    let asked_at = Utc::now();

    tracing::info!(%mode, "dispatching query");
    let answer = engine.query(&api_key, question, mode).await?;

    let turn = ChatTurn {
        question: question.to_string(),
        answer,
        mode,
        asked_at,
        answered_at: Utc::now(),
    };
    session.push_turn(turn.clone());

    Ok(turn)
}

/// CLI entry: `docchat query "<question>" [--mode m] [--file f]...`.
///
/// Files given with `--file` are ingested first; the session is per
/// invocation, so querying without any `--file` fails with the
/// empty-index condition.
pub async fn run_query(
    engine: &dyn RagEngine,
    config: &Config,
    session: &mut Session,
    question: &str,
    mode: QueryMode,
    files: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    if !files.is_empty() {
        crate::ingest::run_ingest(engine, config, session, files).await?;
    }

    let turn = dispatch_query(engine, session, question, Some(mode)).await?;

    println!("{}", turn.answer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Engine that must never be reached; used to prove preconditions
    /// short-circuit before any call.
    struct UnreachableEngine;

    #[async_trait]
    impl RagEngine for UnreachableEngine {
        fn name(&self) -> &str {
            "unreachable"
        }
        async fn health(&self) -> Result<bool, EngineError> {
            panic!("health must not be called");
        }
        async fn ingest_text(
            &self,
            _api_key: Option<&str>,
            _text: &str,
            _source_name: &str,
        ) -> Result<(), EngineError> {
            panic!("ingest must not be called");
        }
        async fn query(
            &self,
            _api_key: &str,
            _question: &str,
            _mode: QueryMode,
        ) -> Result<String, EngineError> {
            panic!("query must not be called");
        }
    }

    #[tokio::test]
    async fn whitespace_question_is_rejected_before_any_call() {
        let mut session = Session::with_api_key(Some("key".to_string()));
        let err = dispatch_query(&UnreachableEngine, &mut session, "   \n", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyQuestion));
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_rejected_before_any_call() {
        let mut session = Session::new();
        let err = dispatch_query(&UnreachableEngine, &mut session, "hello?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Authentication(_)));
        assert!(session.turns().is_empty());
    }
}
