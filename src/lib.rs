//! # docchat
//!
//! Chat with your documents — a thin web front end over an external
//! retrieval-augmented-generation engine.
//!
//! docchat owns no retrieval, indexing, embedding, or persistence logic.
//! It extracts text from uploaded documents, forwards that text to an
//! external RAG engine over HTTP, and relays the engine's answers (which
//! the engine produces by calling a hosted LLM with the user's API key)
//! into a chat UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────────┐   ┌───────────┐
//! │  Web UI  │──▶│  Ingest/  │──▶│  RAG engine  │──▶│  LLM API  │
//! │ (chat)   │   │  Dispatch │   │  (external)  │   │ (external)│
//! └──────────┘   └───────────┘   └─────────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docchat serve                           # start the chat UI
//! docchat ingest notes.md report.pdf      # ingest from the shell
//! docchat query "what changed?" --file notes.md --mode hybrid
//! docchat modes                           # list query modes
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Text extraction (txt/md/pdf/docx) |
//! | [`engine`] | External RAG engine client |
//! | [`ingest`] | Document ingestion pipeline |
//! | [`query`] | Query dispatch |
//! | [`session`] | Per-process session state |
//! | [`server`] | Web UI and JSON API |

pub mod config;
pub mod engine;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod query;
pub mod server;
pub mod session;
