//! Error types for the paperlens library.
//!
//! There is a single fatal taxonomy, [`PaperLensError`]. The two core
//! utilities sit at opposite ends of it:
//!
//! * The **text extractor** fails only for environmental reasons
//!   ([`PaperLensError::EnvironmentUnsupported`]), for oversized input, or when
//!   the scan itself blows up ([`PaperLensError::ExtractionFailed`]). A buffer
//!   that simply contains no readable text is *not* an error under the default
//!   fallback policy: the caller gets the placeholder document instead.
//!
//! * The **markup normalizer** has no error type at all. Unmatched input
//!   passes through as paragraph text.
//!
//! Everything else (input resolution, provider setup, LLM calls, request
//! validation) belongs to the assistant layer around those two utilities.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by [`PaperLensError::ExtractionFailed`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All fatal errors returned by the paperlens library.
#[derive(Debug, Error)]
pub enum PaperLensError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The buffer is larger than `ExtractOptions::max_input_bytes`.
    #[error("Input '{filename}' is {size} bytes, above the {limit}-byte extraction limit")]
    InputTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Extraction was invoked where the blocking scan cannot be hosted.
    #[error("Text extraction is unavailable in this environment: {detail}")]
    EnvironmentUnsupported { detail: String },

    /// The scan failed unexpectedly, or the fallback policy rejected its result.
    #[error("Failed to extract text from '{filename}': {detail}")]
    ExtractionFailed {
        filename: String,
        detail: String,
        #[source]
        source: Option<BoxedCause>,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after all retries, or failed in a way
    /// retrying cannot fix (`recoverable == false`).
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError {
        message: String,
        retries: u32,
        recoverable: bool,
    },

    /// A single LLM call exceeded `api_timeout_secs`.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Request errors ────────────────────────────────────────────────────
    /// An assistant request had an unknown type or lacked required fields.
    #[error("Invalid request type or missing parameters: {0}")]
    InvalidRequest(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PaperLensError {
    /// Build an [`PaperLensError::ExtractionFailed`] with no underlying cause.
    pub fn extraction_failed(filename: impl Into<String>, detail: impl Into<String>) -> Self {
        PaperLensError::ExtractionFailed {
            filename: filename.into(),
            detail: detail.into(),
            source: None,
        }
    }

    /// True for errors a caller may reasonably retry (network trouble).
    ///
    /// Extraction errors are never retryable: the scan is deterministic.
    /// LLM errors are retryable unless the provider rejected the request
    /// outright (bad key, unknown model, invalid parameters).
    pub fn is_transient(&self) -> bool {
        match self {
            PaperLensError::LlmApiError { recoverable, .. } => *recoverable,
            PaperLensError::DownloadFailed { .. }
            | PaperLensError::DownloadTimeout { .. }
            | PaperLensError::ApiTimeout { .. } => true,
            _ => false,
        }
    }
}
