//! The research assistant: extracted text in, rendered analysis and answers out.
//!
//! [`PaperAssistant`] owns a resolved LLM provider and an [`AssistConfig`].
//! It answers the two request types of [`crate::api`]:
//!
//! * **process_pdf** builds the analysis prompt around the first
//!   `context_chars` characters of a document's text;
//! * **query** answers one question against a context string.
//!
//! Every answer goes through the markup normaliser before it is returned.
//! [`PaperSession`] strings the steps together the way an interactive client
//! uses them: extract once, analyse once, then ask as many questions as
//! needed against the analysis.

use crate::api::{AssistRequest, AssistResponse, ResponseData, Task};
use crate::config::{AssistConfig, DEFAULT_MODEL};
use crate::error::PaperLensError;
use crate::extract::extract_file;
use crate::output::{AssistReply, ExtractedDocument};
use crate::pipeline::llm::{self, Completion};
use crate::pipeline::markup::{render_html_with, strip_reasoning};
use crate::prompts;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::info;

/// `message` field of a successful process_pdf response.
pub const PROCESSED_MESSAGE: &str = "PDF processed successfully";

/// LLM-backed analysis and question answering over extracted text.
pub struct PaperAssistant {
    provider: Arc<dyn LLMProvider>,
    config: AssistConfig,
}

impl std::fmt::Debug for PaperAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperAssistant")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PaperAssistant {
    /// Resolve a provider from `config` and the environment.
    ///
    /// # Errors
    /// [`PaperLensError::ProviderNotConfigured`] when no provider can be built.
    pub fn new(config: AssistConfig) -> Result<Self, PaperLensError> {
        let provider = resolve_provider(&config)?;
        Ok(Self { provider, config })
    }

    /// Use an already constructed provider, ignoring provider fields in `config`.
    pub fn with_provider(provider: Arc<dyn LLMProvider>, config: AssistConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Analyse a document's extracted text.
    pub async fn process_pdf(&self, pdf_content: &str) -> Result<AssistReply, PaperLensError> {
        if pdf_content.is_empty() {
            return Err(PaperLensError::InvalidRequest("`pdfContent` is required".into()));
        }
        info!("Processing document text ({} chars)", pdf_content.len());
        let prompt = prompts::analysis_prompt(pdf_content, self.config.context_chars);
        let completion = llm::complete(&self.provider, &prompt, &self.config).await?;
        Ok(self.reply(completion))
    }

    /// Answer `question` from `context`.
    pub async fn query(&self, question: &str, context: &str) -> Result<AssistReply, PaperLensError> {
        if question.is_empty() || context.is_empty() {
            return Err(PaperLensError::InvalidRequest(
                "`question` and `context` are required".into(),
            ));
        }
        info!("Answering question: {}", prompts::truncate_chars(question, 100));
        let prompt = prompts::query_prompt(question, context);
        let completion = llm::complete(&self.provider, &prompt, &self.config).await?;
        Ok(self.reply(completion))
    }

    /// Validate and dispatch one envelope request.
    ///
    /// Errors are returned rather than folded into the response so callers
    /// can map them to transport status codes; see [`Self::respond`] for the
    /// folded form.
    pub async fn handle(&self, request: &AssistRequest) -> Result<AssistResponse, PaperLensError> {
        match request.validate()? {
            Task::ProcessPdf { pdf_content } => {
                let reply = self.process_pdf(pdf_content).await?;
                Ok(AssistResponse::ok(ResponseData::Processed {
                    processed_content: reply.html,
                    message: PROCESSED_MESSAGE.to_string(),
                }))
            }
            Task::Query { question, context } => {
                let reply = self.query(question, context).await?;
                Ok(AssistResponse::ok(ResponseData::Answer {
                    answer: reply.html,
                    model: self.provider.model().to_string(),
                }))
            }
        }
    }

    /// [`Self::handle`] with any error turned into a failure response.
    pub async fn respond(&self, request: &AssistRequest) -> AssistResponse {
        match self.handle(request).await {
            Ok(response) => response,
            Err(e) => AssistResponse::from(&e),
        }
    }

    fn reply(&self, completion: Completion) -> AssistReply {
        AssistReply {
            raw: strip_reasoning(&completion.content),
            html: render_html_with(&completion.content, &self.config.markup),
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
            duration_ms: completion.duration_ms,
            retries: completion.retries,
        }
    }
}

/// One document, analysed once and open for questions.
#[derive(Debug)]
pub struct PaperSession {
    assistant: Arc<PaperAssistant>,
    document: ExtractedDocument,
    analysis: AssistReply,
}

impl PaperSession {
    /// Extract `input` (path or URL) and analyse it.
    pub async fn open(assistant: Arc<PaperAssistant>, input: &str) -> Result<Self, PaperLensError> {
        let config = assistant.config();
        let document = extract_file(input, &config.extract, config.download_timeout_secs).await?;
        Self::from_document(assistant, document).await
    }

    /// Analyse an already extracted document.
    pub async fn from_document(
        assistant: Arc<PaperAssistant>,
        document: ExtractedDocument,
    ) -> Result<Self, PaperLensError> {
        let analysis = assistant.process_pdf(&document.text).await?;
        Ok(Self {
            assistant,
            document,
            analysis,
        })
    }

    pub fn document(&self) -> &ExtractedDocument {
        &self.document
    }

    pub fn analysis(&self) -> &AssistReply {
        &self.analysis
    }

    /// Answer one question using the analysis as context.
    pub async fn ask(&self, question: &str) -> Result<AssistReply, PaperLensError> {
        self.assistant.query(question, &self.analysis.raw).await
    }

    /// Answer several questions, at most `concurrency` in flight.
    ///
    /// Results come back in question order; one failed question does not
    /// affect the others.
    pub async fn ask_many(&self, questions: &[String]) -> Vec<Result<AssistReply, PaperLensError>> {
        let concurrency = self.assistant.config().concurrency.max(1);
        let mut results: Vec<(usize, Result<AssistReply, PaperLensError>)> =
            stream::iter(questions.iter().enumerate())
                .map(|(i, q)| async move { (i, self.ask(q).await) })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PaperLensError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PaperLensError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]; the factory reads the matching API key.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when
///    both are set and non-empty.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &AssistConfig) -> Result<Arc<dyn LLMProvider>, PaperLensError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_name());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PaperLensError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be detected from the environment.\n\
                 Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                 Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
