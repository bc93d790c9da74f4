//! The JSON request/response envelope spoken by the assistant endpoint.
//!
//! ```json
//! { "type": "process_pdf", "pdfContent": "..." }
//! { "type": "query", "question": "...", "context": "..." }
//! ```
//!
//! answered by
//!
//! ```json
//! { "success": true, "data": { "processedContent": "<p>…</p>", "message": "…" } }
//! { "success": true, "data": { "answer": "<p>…</p>", "model": "…" } }
//! { "success": false, "error": "…" }
//! ```

use crate::error::PaperLensError;
use serde::{Deserialize, Serialize};

/// Discriminator of an [`AssistRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    ProcessPdf,
    Query,
    /// Any other `type` value; rejected by [`AssistRequest::validate`].
    #[serde(other)]
    Unknown,
}

/// One assistant request as received over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task<'a> {
    ProcessPdf { pdf_content: &'a str },
    Query { question: &'a str, context: &'a str },
}

impl AssistRequest {
    pub fn process_pdf(pdf_content: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::ProcessPdf,
            pdf_content: Some(pdf_content.into()),
            question: None,
            context: None,
        }
    }

    pub fn query(question: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Query,
            pdf_content: None,
            question: Some(question.into()),
            context: Some(context.into()),
        }
    }

    /// Check the type and required fields. Empty strings count as missing.
    pub fn validate(&self) -> Result<Task<'_>, PaperLensError> {
        fn present<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, PaperLensError> {
            field
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| PaperLensError::InvalidRequest(format!("`{name}` is required")))
        }

        match self.kind {
            RequestKind::ProcessPdf => Ok(Task::ProcessPdf {
                pdf_content: present(&self.pdf_content, "pdfContent")?,
            }),
            RequestKind::Query => Ok(Task::Query {
                question: present(&self.question, "question")?,
                context: present(&self.context, "context")?,
            }),
            RequestKind::Unknown => Err(PaperLensError::InvalidRequest(
                "`type` must be \"process_pdf\" or \"query\"".to_string(),
            )),
        }
    }
}

/// Payload of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    #[serde(rename_all = "camelCase")]
    Processed {
        processed_content: String,
        message: String,
    },
    Answer { answer: String, model: String },
}

/// One assistant response as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssistResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl From<&PaperLensError> for AssistResponse {
    fn from(e: &PaperLensError) -> Self {
        AssistResponse::failure(e.to_string())
    }
}
