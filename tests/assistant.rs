//! Assistant tests against in-process providers: no network, no API key.
//!
//! `MockProvider` replays queued answers; the two providers below cover what
//! it cannot: answers that depend on the prompt, and calls that fail.

use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, LLMResponse, LlmError, MockProvider,
};
use paperlens::assistant::PROCESSED_MESSAGE;
use paperlens::{
    extract_text, render_html, strip_reasoning, AssistConfig, AssistRequest, ExtractOptions,
    PaperAssistant, PaperLensError, PaperSession, ResponseData,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test providers ───────────────────────────────────────────────────────────

const ANALYSIS: &str = "<think>outline the summary first</think>## Findings\n\n\
Sparse attention is **linear** in memory.\n\n- local window\n- global tokens";

/// Answers analysis prompts with [`ANALYSIS`] and question prompts by echoing
/// the question. `question N` is delayed so that later questions finish first.
#[derive(Default)]
struct EchoProvider {
    prompts: Mutex<Vec<String>>,
}

impl EchoProvider {
    fn answer(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match prompt.lines().find_map(|l| l.strip_prefix("Question: ")) {
            Some(q) => format!("<think>look it up</think>**Answer:** {q}"),
            None => ANALYSIS.to_string(),
        }
    }

    fn delay_for(prompt: &str) -> Duration {
        let n = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Question: question "))
            .and_then(|n| n.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Duration::from_millis(50u64.saturating_sub(n * 10))
    }
}

#[async_trait]
impl LLMProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-1"
    }

    fn max_context_length(&self) -> usize {
        8192
    }

    async fn complete(&self, prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        tokio::time::sleep(Self::delay_for(prompt)).await;
        Ok(LLMResponse::new(self.answer(prompt), "echo-1"))
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete(prompt).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.complete(&prompt).await
    }
}

/// Fails every call with the error built by `make`, counting attempts.
struct FailingProvider {
    make: fn() -> LlmError,
    calls: AtomicUsize,
}

impl FailingProvider {
    fn new(make: fn() -> LlmError) -> Self {
        Self {
            make,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LLMProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "failing-1"
    }

    fn max_context_length(&self) -> usize {
        8192
    }

    async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.make)())
    }

    async fn complete_with_options(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete(prompt).await
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _options: Option<&CompletionOptions>,
    ) -> edgequake_llm::Result<LLMResponse> {
        self.complete("").await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn fast_config() -> AssistConfig {
    AssistConfig::builder()
        .max_retries(2)
        .retry_backoff_ms(1)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

async fn mock_assistant(responses: &[&str]) -> PaperAssistant {
    let mock = MockProvider::new();
    for r in responses {
        mock.add_response(*r).await;
    }
    PaperAssistant::with_provider(Arc::new(mock), fast_config())
}

fn paper() -> paperlens::ExtractedDocument {
    let mut pdf = b"%PDF-1.4\nBT\n".to_vec();
    for _ in 0..5 {
        pdf.extend_from_slice(b"(Sparse attention restricts each token to a local window) Tj\n");
    }
    pdf.extend_from_slice(b"ET\n%%EOF");
    extract_text(&pdf, "sparse.pdf", &ExtractOptions::default()).unwrap()
}

// ── PaperAssistant ───────────────────────────────────────────────────────────

#[tokio::test]
async fn process_pdf_returns_stripped_and_rendered_answer() {
    let assistant = mock_assistant(&[ANALYSIS]).await;
    let reply = assistant.process_pdf("some extracted text").await.unwrap();

    assert_eq!(reply.raw, strip_reasoning(ANALYSIS));
    assert_eq!(reply.html, render_html(ANALYSIS));
    assert!(reply.html.starts_with("<h2>Findings</h2>"), "{}", reply.html);
    assert!(!reply.html.contains("outline the summary"));
    assert_eq!(reply.retries, 0);
}

#[tokio::test]
async fn handle_process_pdf_fills_envelope() {
    let assistant = mock_assistant(&[ANALYSIS]).await;
    let resp = assistant
        .handle(&AssistRequest::process_pdf("some extracted text"))
        .await
        .unwrap();

    assert!(resp.success);
    match resp.data {
        Some(ResponseData::Processed {
            processed_content,
            message,
        }) => {
            assert_eq!(processed_content, render_html(ANALYSIS));
            assert_eq!(message, PROCESSED_MESSAGE);
        }
        other => panic!("expected processed data, got {other:?}"),
    }
}

#[tokio::test]
async fn handle_query_reports_provider_model() {
    let assistant = mock_assistant(&["<think>hidden</think>**Result:** done"]).await;
    let resp = assistant
        .handle(&AssistRequest::query("What is the result?", "<p>context</p>"))
        .await
        .unwrap();

    match resp.data {
        Some(ResponseData::Answer { answer, model }) => {
            assert_eq!(answer, "<p><strong>Result:</strong> done</p>");
            assert_eq!(model, "mock-model");
        }
        other => panic!("expected answer data, got {other:?}"),
    }
}

#[tokio::test]
async fn respond_folds_llm_failure_into_envelope() {
    let provider = Arc::new(FailingProvider::new(|| {
        LlmError::NetworkError("connection reset".into())
    }));
    let assistant = PaperAssistant::with_provider(provider.clone(), fast_config());

    let resp = assistant
        .respond(&AssistRequest::query("Why?", "context"))
        .await;
    assert!(!resp.success);
    assert!(resp.data.is_none());
    assert!(resp.error.unwrap().contains("connection reset"));
    // One first attempt plus two retries.
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn respond_folds_invalid_request_into_envelope() {
    let assistant = mock_assistant(&[]).await;
    let resp = assistant.respond(&AssistRequest::query("", "context")).await;
    assert!(!resp.success);
    assert!(resp
        .error
        .unwrap()
        .starts_with("Invalid request type or missing parameters"));
}

#[tokio::test]
async fn permanent_llm_error_is_not_retried() {
    let provider = Arc::new(FailingProvider::new(|| LlmError::AuthError("bad key".into())));
    let assistant = PaperAssistant::with_provider(provider.clone(), fast_config());

    let err = assistant.process_pdf("text").await.unwrap_err();
    assert!(matches!(
        err,
        PaperLensError::LlmApiError {
            retries: 0,
            recoverable: false,
            ..
        }
    ));
    assert!(!err.is_transient());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

// ── PaperSession ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_asks_against_stripped_analysis() {
    let provider = Arc::new(EchoProvider::default());
    let assistant = Arc::new(PaperAssistant::with_provider(provider.clone(), fast_config()));

    let session = PaperSession::from_document(assistant, paper()).await.unwrap();
    assert_eq!(session.document().metadata.title, "sparse");
    assert_eq!(session.analysis().raw, strip_reasoning(ANALYSIS));

    let reply = session.ask("How is memory used?").await.unwrap();
    assert_eq!(
        reply.html,
        "<p><strong>Answer:</strong> How is memory used?</p>"
    );

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Sparse attention restricts each token"));
    assert!(prompts[1].contains(&format!("Context: {}", strip_reasoning(ANALYSIS))));
    assert!(!prompts[1].contains("outline the summary"));
}

#[tokio::test]
async fn ask_many_keeps_question_order() {
    let provider = Arc::new(EchoProvider::default());
    let config = AssistConfig::builder()
        .concurrency(5)
        .build()
        .unwrap();
    let assistant = Arc::new(PaperAssistant::with_provider(provider, config));
    let session = PaperSession::from_document(assistant, paper()).await.unwrap();

    let questions: Vec<String> = (0..5).map(|i| format!("question {i}")).collect();
    let answers = session.ask_many(&questions).await;

    assert_eq!(answers.len(), questions.len());
    for (q, answer) in questions.iter().zip(&answers) {
        let reply = answer.as_ref().expect("every question should be answered");
        assert_eq!(reply.raw, format!("**Answer:** {q}"));
    }
}

#[tokio::test]
async fn ask_many_isolates_failures() {
    let assistant = Arc::new(mock_assistant(&[ANALYSIS, "first", "third"]).await);
    let session = PaperSession::from_document(assistant, paper()).await.unwrap();

    let answers = session
        .ask_many(&["one".to_string(), String::new(), "three".to_string()])
        .await;
    assert!(answers[0].is_ok());
    assert!(matches!(answers[1], Err(PaperLensError::InvalidRequest(_))));
    assert!(answers[2].is_ok());
}
