//! Text extraction entry points.
//!
//! The extractor is a heuristic, not a PDF parser: it never decodes the
//! object graph, fonts, or compressed streams. It recovers whatever text sits
//! in plain sight in the buffer and, when that is too little to be useful,
//! substitutes a placeholder outline so downstream analysis still has
//! something to work with.
//!
//! [`extract_text`] is synchronous and pure. [`extract_text_async`] moves the
//! same scan onto Tokio's blocking pool, and [`extract_file`] adds input
//! resolution in front of it.

use crate::config::{ExtractOptions, FallbackPolicy};
use crate::error::PaperLensError;
use crate::output::{DocumentMetadata, ExtractedDocument, TextOrigin};
use crate::pipeline::{input, literal, normalize, printable};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Pass B runs when pass A produced fewer characters than this.
pub const PASS_A_MIN_CHARS: usize = 200;

/// Extract readable text from a document buffer.
///
/// # Errors
/// - [`PaperLensError::InputTooLarge`] when `bytes` exceeds
///   `opts.max_input_bytes`
/// - [`PaperLensError::ExtractionFailed`] when the result is insufficient and
///   `opts.fallback` is [`FallbackPolicy::Fail`]
///
/// With the default [`FallbackPolicy::Placeholder`] a buffer with no readable
/// text still succeeds, carrying the placeholder document.
pub fn extract_text(
    bytes: &[u8],
    filename: &str,
    opts: &ExtractOptions,
) -> Result<ExtractedDocument, PaperLensError> {
    let start = Instant::now();

    if let Some(limit) = opts.max_input_bytes {
        if bytes.len() > limit {
            return Err(PaperLensError::InputTooLarge {
                filename: filename.to_string(),
                size: bytes.len(),
                limit,
            });
        }
    }

    // ── Pass A: literal spans ────────────────────────────────────────────
    let decoded = String::from_utf8_lossy(bytes);
    let mut text = literal::scan_literals(&decoded);
    let mut origin = TextOrigin::Literals;
    debug!("{}: pass A recovered {} chars", filename, text.len());

    // ── Pass B: printable runs ───────────────────────────────────────────
    if text.len() < PASS_A_MIN_CHARS {
        let runs = printable::scan_printable_runs(bytes);
        debug!("{}: pass B recovered {} chars", filename, runs.len());
        if !runs.is_empty() {
            text.push_str(&runs);
            origin = TextOrigin::PrintableRuns;
        }
    }

    // ── Normalise and judge ──────────────────────────────────────────────
    let mut text = normalize::normalize_text(&text);
    let metadata = DocumentMetadata::from_filename(filename);

    if normalize::is_insufficient(&text) {
        match opts.fallback {
            FallbackPolicy::Placeholder => {
                warn!(
                    "{}: only {} chars of text recovered, using placeholder",
                    filename,
                    text.len()
                );
                text = normalize::placeholder_document(&metadata.title);
                origin = TextOrigin::Placeholder;
            }
            FallbackPolicy::Fail => {
                return Err(PaperLensError::extraction_failed(
                    filename,
                    format!(
                        "only {} characters of readable text (need {} chars and {} words)",
                        text.len(),
                        normalize::MIN_TEXT_CHARS,
                        normalize::MIN_TEXT_TOKENS
                    ),
                ));
            }
        }
    }

    let doc = ExtractedDocument {
        text,
        page_estimate: normalize::page_estimate(bytes.len()),
        metadata,
        origin,
        byte_len: bytes.len(),
    };
    info!(
        "Extracted {} words from {} ({} bytes, {:?}) in {:?}",
        doc.word_count(),
        filename,
        doc.byte_len,
        doc.origin,
        start.elapsed()
    );
    Ok(doc)
}

/// [`extract_text`] on Tokio's blocking pool.
///
/// # Errors
/// - [`PaperLensError::EnvironmentUnsupported`] when called outside a Tokio
///   runtime
/// - [`PaperLensError::ExtractionFailed`] with the join error as its source
///   when the scan task panicked or was cancelled
/// - anything [`extract_text`] returns
pub async fn extract_text_async(
    bytes: Vec<u8>,
    filename: impl Into<String>,
    opts: &ExtractOptions,
) -> Result<ExtractedDocument, PaperLensError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|e| {
        PaperLensError::EnvironmentUnsupported {
            detail: e.to_string(),
        }
    })?;

    let filename = filename.into();
    let task_name = filename.clone();
    let opts = opts.clone();
    handle
        .spawn_blocking(move || extract_text(&bytes, &filename, &opts))
        .await
        .map_err(|e| PaperLensError::ExtractionFailed {
            filename: task_name,
            detail: "scan task did not complete".to_string(),
            source: Some(Box::new(e)),
        })?
}

/// Load a local path or HTTP(S) URL and extract its text.
pub async fn extract_file(
    input_str: impl AsRef<str>,
    opts: &ExtractOptions,
    download_timeout_secs: u64,
) -> Result<ExtractedDocument, PaperLensError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);
    let loaded = input::load_input(input_str, download_timeout_secs, opts.max_input_bytes).await?;
    extract_text_async(loaded.bytes, loaded.filename, opts).await
}
