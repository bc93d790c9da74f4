//! Prompt templates for document analysis and question answering.
//!
//! Both prompts are plain user turns: reasoning models ignore most system
//! prompts, and the instruction to leave out the deliberation has to sit next
//! to the content to be followed reliably. Whatever reasoning still comes
//! back is removed by [`crate::pipeline::markup::strip_reasoning`].

/// Instruction shared by both prompts.
pub const OMIT_REASONING: &str = "Provide only the final answer. Do not include your thinking \
process, reasoning steps, or internal deliberations in the output.";

/// Build the analysis prompt around the first `context_chars` characters of
/// the extracted text.
pub fn analysis_prompt(pdf_content: &str, context_chars: usize) -> String {
    format!(
        "Please analyze the following research paper content and extract key concepts, \
findings, and important information. Provide a comprehensive analysis that can be used \
for Q&A.

IMPORTANT: {OMIT_REASONING}

{content}

Please provide a structured analysis including:
1. Key research questions and objectives
2. Methodology and approach
3. Main findings and results
4. Conclusions and implications
5. Important figures, tables, or data points

Format your response in a way that will be useful for answering specific questions \
about this research paper.",
        content = truncate_chars(pdf_content, context_chars)
    )
}

/// Build the question-answering prompt.
///
/// `context` is passed through whole; callers bound it (usually the analysis
/// produced by [`analysis_prompt`]).
pub fn query_prompt(question: &str, context: &str) -> String {
    format!(
        "Based on the following research paper context, please answer this question \
comprehensively and accurately.

IMPORTANT: {OMIT_REASONING}

Context: {context}

Question: {question}

Please provide a detailed answer that:
1. References specific parts of the research paper
2. Explains the methodology, results, or conclusions as relevant
3. Provides clear, understandable explanations
4. Cites specific findings or data when applicable

Answer:"
    )
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 4), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn analysis_prompt_limits_content() {
        let content = "x".repeat(5000);
        let prompt = analysis_prompt(&content, 4000);
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
        assert!(prompt.contains("Key research questions"));
        assert!(prompt.contains(OMIT_REASONING));
    }

    #[test]
    fn query_prompt_carries_question_and_context() {
        let prompt = query_prompt("What is attention?", "Transformers paper");
        assert!(prompt.contains("Context: Transformers paper"));
        assert!(prompt.contains("Question: What is attention?"));
        assert!(prompt.trim_end().ends_with("Answer:"));
    }
}
