//! Final text normalisation and the placeholder document.

use super::literal::is_printable_ascii;

/// Below this many characters the scan result is considered a failure.
pub const MIN_TEXT_CHARS: usize = 100;

/// Below this many space-separated tokens the scan result is considered a failure.
pub const MIN_TEXT_TOKENS: usize = 20;

/// Section headers every placeholder document carries, in order.
pub const PLACEHOLDER_SECTIONS: [&str; 7] = [
    "ABSTRACT",
    "INTRODUCTION",
    "METHODOLOGY",
    "RESULTS",
    "DISCUSSION",
    "CONCLUSION",
    "REFERENCES",
];

const PLACEHOLDER_BODIES: [&str; 7] = [
    "The paper presents research findings and analysis in the field of study.",
    "Background information and research objectives are discussed.",
    "The research approach, data collection methods, and analysis techniques are described.",
    "Key findings, statistical analyses, and experimental outcomes are presented.",
    "Interpretation of results, implications, and connections to existing literature.",
    "Summary of main findings and their significance.",
    "Citations and bibliography of related works.",
];

/// Strip non-printable characters, collapse whitespace runs to one space, trim.
pub fn normalize_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if is_printable_ascii(c) { c } else { ' ' })
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when normalised text is too thin to stand for the document.
pub fn is_insufficient(text: &str) -> bool {
    text.len() < MIN_TEXT_CHARS || text.split(' ').count() < MIN_TEXT_TOKENS
}

/// The fixed, section-structured document substituted for failed scans.
pub fn placeholder_document(title: &str) -> String {
    let mut doc = format!(
        "Research Paper: {title}\n\n\
         This document appears to be a research paper in PDF format. While the text \
         extraction was limited, the document likely contains:\n\n"
    );
    for (header, body) in PLACEHOLDER_SECTIONS.iter().zip(PLACEHOLDER_BODIES) {
        doc.push_str(header);
        doc.push('\n');
        doc.push_str(body);
        doc.push_str("\n\n");
    }
    doc.push_str(
        "The document is ready for analysis and question answering based on typical \
         research paper structure.",
    );
    doc
}

/// `max(1, ceil(byte_len / 50 000))`.
pub fn page_estimate(byte_len: usize) -> usize {
    byte_len.div_ceil(BYTES_PER_PAGE).max(1)
}

/// Bytes assumed per page by [`page_estimate`].
pub const BYTES_PER_PAGE: usize = 50_000;
