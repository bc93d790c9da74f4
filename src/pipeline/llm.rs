//! LLM interaction: send one prompt and collect the answer.
//!
//! All prompt wording lives in [`crate::prompts`]; this module only owns the
//! call itself, its timeout, and the retry policy.
//!
//! ## Retry Strategy
//!
//! Rate-limit and overload errors are transient and frequent on shared
//! inference endpoints. Each attempt is bounded by `api_timeout_secs`; a failed
//! or timed-out attempt is retried after `retry_backoff_ms * 2^(attempt-1)`,
//! so with a 500 ms base and 2 retries the waits are 500 ms → 1 s.
//!
//! Errors the provider marks as permanent (authentication, unknown model,
//! invalid request) end the loop at once; see [`PaperLensError::is_transient`].

use crate::config::AssistConfig;
use crate::error::PaperLensError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// The successful outcome of [`complete`].
#[derive(Debug, Clone)]
pub struct Completion {
    /// Model output exactly as received.
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Failed attempts before this one succeeded.
    pub retries: u32,
}

/// Send `prompt` as a single user turn and return the model's answer.
///
/// Fails with [`PaperLensError::ApiTimeout`] when the final attempt timed
/// out, or [`PaperLensError::LlmApiError`] when it returned an error or a
/// non-recoverable error ended the retries early.
pub async fn complete(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    config: &AssistConfig,
) -> Result<Completion, PaperLensError> {
    let start = Instant::now();
    let messages = vec![ChatMessage::user(prompt)];
    let options = build_options(config);
    let per_call = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<PaperLensError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "LLM call: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(per_call, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "LLM call: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(Completion {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                warn!("LLM call: attempt {} failed: {}", attempt + 1, e);
                let err = PaperLensError::LlmApiError {
                    message: e.to_string(),
                    retries: attempt,
                    recoverable: e.is_recoverable(),
                };
                if !err.is_transient() {
                    return Err(err);
                }
                last_err = Some(err);
            }
            Err(_) => {
                warn!(
                    "LLM call: attempt {} timed out after {}s",
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(PaperLensError::ApiTimeout {
                    secs: config.api_timeout_secs,
                });
            }
        }
    }

    Err(last_err.unwrap_or_else(|| PaperLensError::LlmApiError {
        message: "Unknown error".to_string(),
        retries: config.max_retries,
        recoverable: true,
    }))
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` from the assistant config.
fn build_options(config: &AssistConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        top_p: Some(config.top_p),
        frequency_penalty: Some(config.frequency_penalty),
        presence_penalty: Some(config.presence_penalty),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
