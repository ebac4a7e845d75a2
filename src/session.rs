//! Per-process session state.
//!
//! The original UI kept its API key, ingested-document flags, and chat
//! history in ambient framework state; here that is one explicit struct
//! passed through every handler. Nothing in it survives a restart.

use crate::models::{ChatTurn, IngestedDocument, QueryMode};

#[derive(Debug, Default)]
pub struct Session {
    api_key: Option<String>,
    mode: QueryMode,
    documents: Vec<IngestedDocument>,
    turns: Vec<ChatTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded with a key from the deployment environment, when set.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Stores the key from sidebar input. An empty string clears it.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: QueryMode) {
        self.mode = mode;
    }

    pub fn documents(&self) -> &[IngestedDocument] {
        &self.documents
    }

    pub fn document_by_hash(&self, dedup_hash: &str) -> Option<&IngestedDocument> {
        self.documents.iter().find(|d| d.dedup_hash == dedup_hash)
    }

    pub fn push_document(&mut self, document: IngestedDocument) {
        self.documents.push(document);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn clear_turns(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_counts_as_absent() {
        let mut session = Session::with_api_key(Some("   ".to_string()));
        assert!(session.api_key().is_none());

        session.set_api_key(Some("sk-123".to_string()));
        assert_eq!(session.api_key(), Some("sk-123"));

        session.set_api_key(Some(String::new()));
        assert!(session.api_key().is_none());
    }

    #[test]
    fn clear_turns_keeps_documents() {
        let mut session = Session::new();
        session.push_document(IngestedDocument {
            id: "d1".to_string(),
            name: "a.txt".to_string(),
            format: crate::models::DocumentFormat::Text,
            text_len: 5,
            dedup_hash: "h".to_string(),
            ingested_at: chrono::Utc::now(),
        });
        session.push_turn(ChatTurn {
            question: "q".to_string(),
            answer: "a".to_string(),
            mode: QueryMode::Hybrid,
            asked_at: chrono::Utc::now(),
            answered_at: chrono::Utc::now(),
        });

        session.clear_turns();
        assert!(session.turns().is_empty());
        assert_eq!(session.documents().len(), 1);
    }
}
