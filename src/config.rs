//! Configuration types for extraction, rendering and the LLM assistant.
//!
//! The two core utilities take small, serialisable option structs
//! ([`ExtractOptions`], [`MarkupOptions`]) passed explicitly on every call;
//! nothing is read from process-wide state. [`AssistConfig`] bundles those
//! with the LLM knobs and is built via [`AssistConfigBuilder`], so callers set
//! only what they care about and rely on documented defaults for the rest.

use crate::error::PaperLensError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model used when a provider is named without an explicit model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// 50 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

// ── Extraction ───────────────────────────────────────────────────────────

/// What to do when heuristic extraction recovers too little text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Substitute the section-structured placeholder document (default).
    ///
    /// Downstream prompts always receive non-trivial text, at the cost of the
    /// LLM analysing a generic outline instead of the real paper.
    #[default]
    Placeholder,
    /// Fail with [`PaperLensError::ExtractionFailed`].
    Fail,
}

/// Options for [`crate::extract::extract_text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Largest buffer the extractor will scan. `None` disables the check.
    /// Default: 50 MiB.
    pub max_input_bytes: Option<usize>,

    /// Behaviour when the scan yields too little text. Default: placeholder.
    pub fallback: FallbackPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: Some(DEFAULT_MAX_INPUT_BYTES),
            fallback: FallbackPolicy::default(),
        }
    }
}

// ── Markup ───────────────────────────────────────────────────────────────

/// How contiguous `<li>` runs are wrapped in `<ul>` containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListWrap {
    /// Every contiguous run of list items gets its own `<ul>` (default).
    #[default]
    EveryRun,
    /// Only the first run is wrapped; later runs stay bare `<li>` elements.
    FirstRun,
}

/// Options for [`crate::pipeline::markup::render_html_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupOptions {
    /// Entity-escape `& < > " '` in the model output before producing tags.
    /// Default: true. Turn off only when the output never reaches a browser.
    pub escape_html: bool,

    /// List container policy. Default: [`ListWrap::EveryRun`].
    pub list_wrap: ListWrap,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            list_wrap: ListWrap::default(),
        }
    }
}

// ── Assistant ────────────────────────────────────────────────────────────

/// Configuration for the paper assistant.
///
/// # Example
/// ```rust
/// use paperlens::AssistConfig;
///
/// let config = AssistConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.3)
///     .context_chars(6000)
///     .build()
///     .unwrap();
/// assert_eq!(config.context_chars, 6000);
/// ```
#[derive(Clone)]
pub struct AssistConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.6.
    pub temperature: f32,

    /// Nucleus sampling mass. Range 0.0–1.0. Default: 0.95.
    pub top_p: f32,

    /// Frequency penalty. Range -2.0–2.0. Default: 0.0.
    pub frequency_penalty: f32,

    /// Presence penalty. Range -2.0–2.0. Default: 0.0.
    pub presence_penalty: f32,

    /// Maximum tokens generated per answer. Default: 2048.
    pub max_tokens: usize,

    /// Retries on a failed LLM call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call LLM timeout in seconds. Default: 90.
    pub api_timeout_secs: u64,

    /// Prefix of the extracted text forwarded in the analysis prompt. Default: 4000.
    ///
    /// Measured in characters, not bytes, so a cut never splits a code point.
    pub context_chars: usize,

    /// Questions answered at once by [`crate::assistant::PaperSession::ask_many`]. Default: 4.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Extraction options.
    pub extract: ExtractOptions,

    /// Rendering options applied to every LLM answer.
    pub markup: MarkupOptions,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.6,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: 2048,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 90,
            context_chars: 4000,
            concurrency: 4,
            download_timeout_secs: 120,
            extract: ExtractOptions::default(),
            markup: MarkupOptions::default(),
        }
    }
}

impl fmt::Debug for AssistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("context_chars", &self.context_chars)
            .field("concurrency", &self.concurrency)
            .field("extract", &self.extract)
            .field("markup", &self.markup)
            .finish()
    }
}

impl AssistConfig {
    /// Create a new builder for `AssistConfig`.
    pub fn builder() -> AssistConfigBuilder {
        AssistConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model requested when a provider is built by name.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AssistConfig`].
#[derive(Debug)]
pub struct AssistConfigBuilder {
    config: AssistConfig,
}

impl AssistConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn frequency_penalty(mut self, v: f32) -> Self {
        self.config.frequency_penalty = v.clamp(-2.0, 2.0);
        self
    }

    pub fn presence_penalty(mut self, v: f32) -> Self {
        self.config.presence_penalty = v.clamp(-2.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn context_chars(mut self, n: usize) -> Self {
        self.config.context_chars = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_input_bytes(mut self, limit: Option<usize>) -> Self {
        self.config.extract.max_input_bytes = limit;
        self
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.extract.fallback = policy;
        self
    }

    pub fn escape_html(mut self, v: bool) -> Self {
        self.config.markup.escape_html = v;
        self
    }

    pub fn list_wrap(mut self, wrap: ListWrap) -> Self {
        self.config.markup.list_wrap = wrap;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AssistConfig, PaperLensError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(PaperLensError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.context_chars == 0 {
            return Err(PaperLensError::InvalidConfig(
                "context_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PaperLensError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.extract.max_input_bytes == Some(0) {
            return Err(PaperLensError::InvalidConfig(
                "max_input_bytes must be ≥ 1 (use None to disable the limit)".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let c = AssistConfig::default();
        assert_eq!(c.context_chars, 4000);
        assert_eq!(c.max_tokens, 2048);
        assert!((c.temperature - 0.6).abs() < f32::EPSILON);
        assert!((c.top_p - 0.95).abs() < f32::EPSILON);
        assert_eq!(c.frequency_penalty, 0.0);
        assert_eq!(c.presence_penalty, 0.0);
        assert_eq!(c.extract.fallback, FallbackPolicy::Placeholder);
        assert!(c.markup.escape_html);
        assert_eq!(c.markup.list_wrap, ListWrap::EveryRun);
        assert_eq!(c.model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps_and_validates() {
        let c = AssistConfig::builder()
            .temperature(9.0)
            .concurrency(0)
            .top_p(1.5)
            .frequency_penalty(-3.0)
            .presence_penalty(0.5)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.top_p, 1.0);
        assert_eq!(c.frequency_penalty, -2.0);
        assert_eq!(c.presence_penalty, 0.5);
        assert_eq!(c.concurrency, 1);

        assert!(AssistConfig::builder().max_tokens(0).build().is_err());
        assert!(AssistConfig::builder().context_chars(0).build().is_err());
        assert!(AssistConfig::builder()
            .max_input_bytes(Some(0))
            .build()
            .is_err());
        assert!(AssistConfig::builder().max_input_bytes(None).build().is_ok());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ExtractOptions = serde_json::from_str(r#"{"fallback":"fail"}"#).unwrap();
        assert_eq!(opts.fallback, FallbackPolicy::Fail);
        assert_eq!(opts.max_input_bytes, Some(DEFAULT_MAX_INPUT_BYTES));

        let markup: MarkupOptions = serde_json::from_str(r#"{"list_wrap":"first_run"}"#).unwrap();
        assert_eq!(markup.list_wrap, ListWrap::FirstRun);
        assert!(markup.escape_html);
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", AssistConfig::default());
        assert!(s.contains("AssistConfig"));
        assert!(s.contains("context_chars"));
    }
}
