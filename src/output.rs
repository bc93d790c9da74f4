//! Output records: what extraction and the assistant hand back to callers.

use serde::{Deserialize, Serialize};

/// Keywords attached to every extracted document.
pub const DEFAULT_KEYWORDS: [&str; 4] = ["research", "analysis", "study", "academic"];

/// Text recovered from one document buffer.
///
/// Built fresh per extraction call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    /// Normalised plain text: printable ASCII, single spaces, trimmed.
    pub text: String,

    /// `max(1, ceil(byte_len / 50 000))`. A volume heuristic, not a page count.
    pub page_estimate: usize,

    /// Filename-derived metadata with constant defaults.
    pub metadata: DocumentMetadata,

    /// Which scan produced `text`.
    pub origin: TextOrigin,

    /// Size of the scanned buffer in bytes.
    pub byte_len: usize,
}

impl ExtractedDocument {
    /// True when the heuristic scan failed and `text` is the placeholder outline.
    pub fn is_placeholder(&self) -> bool {
        self.origin == TextOrigin::Placeholder
    }

    /// Number of space-separated tokens in `text`.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Best-effort document metadata.
///
/// None of these fields come from the PDF's own info dictionary: `title` is
/// the filename without its `.pdf` suffix and the rest are constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: Vec<String>,
}

impl DocumentMetadata {
    /// Metadata for a document uploaded under `filename`.
    pub fn from_filename(filename: &str) -> Self {
        Self {
            title: title_from_filename(filename),
            author: "Unknown".to_string(),
            subject: "Research Paper".to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Strip any directory part and a trailing `.pdf` (any case) from `filename`.
pub fn title_from_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let split = base.len().checked_sub(4);
    match split.and_then(|i| base.get(i..).map(|ext| (i, ext))) {
        Some((i, ext)) if ext.eq_ignore_ascii_case(".pdf") => base[..i].to_string(),
        _ => base.to_string(),
    }
}

/// Which path of the extractor produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    /// Parenthesised text-show literals alone were enough.
    Literals,
    /// The raw printable-run scan contributed text.
    PrintableRuns,
    /// Both scans came up short; the placeholder outline was substituted.
    Placeholder,
}

/// One LLM answer, before and after rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistReply {
    /// Model output with reasoning spans removed, still in markdown.
    pub raw: String,
    /// `raw` rendered to display-safe HTML.
    pub html: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Failed attempts before the successful one.
    pub retries: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_pdf_suffix_and_directories() {
        assert_eq!(title_from_filename("x.pdf"), "x");
        assert_eq!(title_from_filename("Attention.PDF"), "Attention");
        assert_eq!(title_from_filename("/tmp/papers/bert.pdf"), "bert");
        assert_eq!(title_from_filename("C:\\docs\\gpt.pdf"), "gpt");
        assert_eq!(title_from_filename("notes.txt"), "notes.txt");
        assert_eq!(title_from_filename(".pdf"), "");
        assert_eq!(title_from_filename("résumé.pdf"), "résumé");
        assert_eq!(title_from_filename("日本"), "日本");
    }

    #[test]
    fn metadata_constants() {
        let m = DocumentMetadata::from_filename("paper.pdf");
        assert_eq!(m.title, "paper");
        assert_eq!(m.author, "Unknown");
        assert_eq!(m.subject, "Research Paper");
        assert_eq!(m.keywords, vec!["research", "analysis", "study", "academic"]);
    }

    #[test]
    fn extracted_document_serialises_camel_case() {
        let doc = ExtractedDocument {
            text: "hello world".into(),
            page_estimate: 1,
            metadata: DocumentMetadata::from_filename("a.pdf"),
            origin: TextOrigin::Literals,
            byte_len: 11,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["pageEstimate"], 1);
        assert_eq!(json["byteLen"], 11);
        assert_eq!(json["origin"], "literals");
        assert_eq!(json["metadata"]["subject"], "Research Paper");
        assert_eq!(doc.word_count(), 2);
        assert!(!doc.is_placeholder());
    }
}
