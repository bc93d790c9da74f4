//! # paperlens
//!
//! A research-paper assistant built from two small, dependency-light utilities
//! and an LLM layer around them.
//!
//! * The **text extractor** recovers readable text from an uploaded PDF buffer
//!   without parsing the PDF object model. When that fails it substitutes a
//!   placeholder outline so analysis can proceed.
//! * The **markup normaliser** turns a chat model's loose markdown answer,
//!   including any `<think>` reasoning trace, into display-safe HTML.
//! * The **assistant** sends the extracted text to an LLM for a structured
//!   analysis and answers follow-up questions against it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input     local file or URL download
//!  ├─ 2. Pass A    parenthesised text-show literals
//!  ├─ 3. Pass B    printable byte runs (only if pass A is short)
//!  ├─ 4. Normalise whitespace cleanup, placeholder on thin results
//!  ├─ 5. LLM       analysis prompt / question prompt, retry + timeout
//!  └─ 6. Markup    strip reasoning, markdown → HTML
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paperlens::{extract_text, render_html, ExtractOptions};
//!
//! let bytes = std::fs::read("paper.pdf")?;
//! let doc = extract_text(&bytes, "paper.pdf", &ExtractOptions::default())?;
//! println!("{} ({} words)", doc.metadata.title, doc.word_count());
//!
//! let html = render_html("<think>hmm</think>**Result:** done");
//! assert_eq!(html, "<p><strong>Result:</strong> done</p>");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! With an LLM provider configured (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …):
//!
//! ```rust,no_run
//! use paperlens::{AssistConfig, PaperAssistant, PaperSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assistant = Arc::new(PaperAssistant::new(AssistConfig::default())?);
//!     let session = PaperSession::open(assistant, "paper.pdf").await?;
//!     let answer = session.ask("What dataset was used?").await?;
//!     println!("{}", answer.html);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `paperlens` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables [`server`] and `paperlens serve` (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! paperlens = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{AssistRequest, AssistResponse, RequestKind, ResponseData};
pub use assistant::{PaperAssistant, PaperSession};
pub use config::{
    AssistConfig, AssistConfigBuilder, ExtractOptions, FallbackPolicy, ListWrap, MarkupOptions,
};
pub use error::PaperLensError;
pub use extract::{extract_file, extract_text, extract_text_async};
pub use output::{AssistReply, DocumentMetadata, ExtractedDocument, TextOrigin};
pub use pipeline::markup::{render_html, render_html_with, strip_reasoning};
