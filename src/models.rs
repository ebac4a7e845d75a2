//! Core data types shared by the ingest, query, and UI layers.
//!
//! Documents themselves are transient — raw bytes are dropped once their
//! text has been handed to the engine. What the session keeps is the
//! lightweight record types defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from a file name's extension. Returns `None`
    /// for anything outside the four supported formats.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy selector passed opaquely to the engine's query call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Hybrid,
    Local,
    Global,
    Naive,
}

impl QueryMode {
    pub const ALL: [QueryMode; 4] = [
        QueryMode::Hybrid,
        QueryMode::Local,
        QueryMode::Global,
        QueryMode::Naive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Local => "local",
            Self::Global => "global",
            Self::Naive => "naive",
        }
    }

    /// One-line description shown in the UI mode selector and `docchat modes`.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Hybrid => "Best overall results (recommended)",
            Self::Local => "Focus on specific entities",
            Self::Global => "High-level summaries",
            Self::Naive => "Simple vector search",
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hybrid" => Ok(Self::Hybrid),
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "naive" => Ok(Self::Naive),
            other => Err(format!(
                "unknown query mode: '{}'. Use hybrid, local, global, or naive.",
                other
            )),
        }
    }
}

/// One question/answer exchange, appended to the session in order.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub mode: QueryMode,
    pub asked_at: DateTime<Utc>,
    pub answered_at: DateTime<Utc>,
}

/// Record kept for each document submitted to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedDocument {
    pub id: String,
    pub name: String,
    pub format: DocumentFormat,
    /// Length of the extracted text, in bytes.
    pub text_len: usize,
    /// SHA-256 of the raw upload, used to skip duplicate re-ingests.
    pub dedup_hash: String,
    pub ingested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_file_name_covers_supported_extensions() {
        assert_eq!(
            DocumentFormat::from_file_name("notes.txt"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::from_file_name("README.md"),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(
            DocumentFormat::from_file_name("paper.MARKDOWN"),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(
            DocumentFormat::from_file_name("report.PDF"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_file_name("contract.docx"),
            Some(DocumentFormat::Docx)
        );
    }

    #[test]
    fn format_from_file_name_rejects_everything_else() {
        assert_eq!(DocumentFormat::from_file_name("image.png"), None);
        assert_eq!(DocumentFormat::from_file_name("legacy.doc"), None);
        assert_eq!(DocumentFormat::from_file_name("no_extension"), None);
        assert_eq!(DocumentFormat::from_file_name(""), None);
    }

    #[test]
    fn query_mode_parses_lowercase_names() {
        assert_eq!("hybrid".parse::<QueryMode>().unwrap(), QueryMode::Hybrid);
        assert_eq!("GLOBAL".parse::<QueryMode>().unwrap(), QueryMode::Global);
        assert!("semantic".parse::<QueryMode>().is_err());
    }

    #[test]
    fn query_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QueryMode::Naive).unwrap(),
            "\"naive\""
        );
    }
}
