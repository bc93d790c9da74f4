//! Pass B: raw printable-run scan.
//!
//! Fallback for documents whose text is not sitting in plain literals (for
//! example when content streams are hex-encoded). Every run of printable
//! ASCII bytes long enough to be a word is kept unless it names a PDF
//! structural keyword.

/// Runs containing any of these are PDF syntax, not page text.
pub const STRUCTURAL_KEYWORDS: [&str; 6] =
    ["obj", "endobj", "stream", "endstream", "xref", "trailer"];

/// A run must be longer than this to be kept.
pub const MIN_RUN_CHARS: usize = 4;

/// Scan `bytes` for printable runs (decimal 32–126).
///
/// A run terminated by a non-printable byte is kept when it is longer than
/// [`MIN_RUN_CHARS`] and free of [`STRUCTURAL_KEYWORDS`]; a kept run is
/// followed by one space. A run still open at end of buffer is flushed when it
/// has at least [`MIN_RUN_CHARS`] characters.
pub fn scan_printable_runs(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut run_start: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if is_printable(b) {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            let run = as_ascii(&bytes[start..i]);
            if run.len() > MIN_RUN_CHARS && !is_structural(run) {
                out.push_str(run);
                out.push(' ');
            }
        }
    }

    if let Some(start) = run_start {
        let run = as_ascii(&bytes[start..]);
        if run.len() >= MIN_RUN_CHARS {
            out.push_str(run);
        }
    }

    out
}

fn is_printable(b: u8) -> bool {
    (32..=126).contains(&b)
}

fn is_structural(run: &str) -> bool {
    STRUCTURAL_KEYWORDS.iter().any(|k| run.contains(k))
}

fn as_ascii(run: &[u8]) -> &str {
    // Every byte in a run is 32–126, which is valid single-byte UTF-8.
    std::str::from_utf8(run).unwrap_or_default()
}
