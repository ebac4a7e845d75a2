//! Document ingestion: upload bytes in, engine index call out.
//!
//! The pipeline per file: size cap → format detection → text extraction →
//! dedup against the session → engine submit → session record. Raw bytes
//! are dropped as soon as the text is extracted. A failing file never
//! aborts a batch; each file reports its own outcome.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{EngineError, RagEngine};
use crate::extract::{self, ExtractError};
use crate::models::{DocumentFormat, IngestedDocument};
use crate::session::Session;

/// Why a single document failed to ingest.
#[derive(Debug)]
pub enum IngestError {
    /// The file name's extension is not one of the four supported formats.
    UnsupportedFormat(String),
    TooLarge { size: usize, limit: usize },
    Extract(ExtractError),
    /// Extraction succeeded but produced only whitespace.
    EmptyDocument,
    Engine(EngineError),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::UnsupportedFormat(name) => {
                write!(
                    f,
                    "unsupported format: '{}' (supported: .txt, .md, .pdf, .docx)",
                    name
                )
            }
            IngestError::TooLarge { size, limit } => {
                write!(f, "file is {} bytes, limit is {}", size, limit)
            }
            IngestError::Extract(e) => write!(f, "{}", e),
            IngestError::EmptyDocument => write!(f, "document produced no text"),
            IngestError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<ExtractError> for IngestError {
    fn from(e: ExtractError) -> Self {
        IngestError::Extract(e)
    }
}

impl From<EngineError> for IngestError {
    fn from(e: EngineError) -> Self {
        IngestError::Engine(e)
    }
}

/// Result of ingesting one file.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: IngestedDocument,
    /// True when the upload matched an already-ingested document and the
    /// engine call was skipped.
    pub deduplicated: bool,
}

/// Ingests one uploaded file: extracts its text and submits it to the
/// engine. On success the session records the document.
pub async fn ingest_document(
    engine: &dyn RagEngine,
    config: &Config,
    session: &mut Session,
    name: &str,
    bytes: &[u8],
) -> Result<IngestOutcome, IngestError> {
    let limit = config.ingest.max_file_bytes;
    if bytes.len() > limit {
        return Err(IngestError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }

    let format = DocumentFormat::from_file_name(name)
        .ok_or_else(|| IngestError::UnsupportedFormat(name.to_string()))?;

    let dedup_hash = hash_bytes(bytes);
    if let Some(existing) = session.document_by_hash(&dedup_hash) {
        tracing::debug!(name, "duplicate upload, skipping engine call");
        return Ok(IngestOutcome {
            document: existing.clone(),
            deduplicated: true,
        });
    }

    let text = extract::extract_text(bytes, format)?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyDocument);
    }

    engine.ingest_text(session.api_key(), &text, name).await?;

    let document = IngestedDocument {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        format,
        text_len: text.len(),
        dedup_hash,
        ingested_at: Utc::now(),
    };
    session.push_document(document.clone());

    tracing::info!(name, format = %format, text_len = document.text_len, "ingested document");

    Ok(IngestOutcome {
        document,
        deduplicated: false,
    })
}

/// Ingests a batch of named files independently; one failure never aborts
/// the rest. Outcomes come back in input order.
pub async fn ingest_batch(
    engine: &dyn RagEngine,
    config: &Config,
    session: &mut Session,
    files: Vec<(String, Vec<u8>)>,
) -> Vec<(String, Result<IngestOutcome, IngestError>)> {
    let mut outcomes = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let outcome = ingest_document(engine, config, session, &name, &bytes).await;
        outcomes.push((name, outcome));
    }
    outcomes
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// CLI entry: `docchat ingest <FILE>...`. Reads each file from disk,
/// ingests it, and prints a per-file line plus a summary.
pub async fn run_ingest(
    engine: &dyn RagEngine,
    config: &Config,
    session: &mut Session,
    paths: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    let mut ok = 0usize;

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                println!("  failed {}: {}", name, e);
                continue;
            }
        };

        match ingest_document(engine, config, session, &name, &bytes).await {
            Ok(outcome) if outcome.deduplicated => {
                println!("  skipped {} (already ingested)", name);
                ok += 1;
            }
            Ok(outcome) => {
                println!("  ok {} ({} chars)", name, outcome.document.text_len);
                ok += 1;
            }
            Err(e) => {
                println!("  failed {}: {}", name, e);
            }
        }
    }

    println!("ingested {}/{} files", ok, paths.len());
    if ok == paths.len() {
        println!("ok");
    }
    Ok(())
}
