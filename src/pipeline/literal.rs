//! Pass A: structured-literal scan.
//!
//! PDF content streams show text with operators like `(Hello) Tj`, where the
//! parenthesised part is a *literal string*. Uncompressed streams therefore
//! leave readable text between parentheses, and this pass harvests it without
//! parsing the object graph.
//!
//! The scan is one forward walk: an opening `(` starts a span, the next
//! unescaped `)` ends it. Nested parentheses are not balanced, which keeps the
//! walk linear on binary garbage that contains stray `(` bytes.

use tracing::trace;

/// Substrings that mark structural objects rather than page text.
pub const STRUCTURAL_MARKERS: [&str; 2] = ["obj", "endobj"];

/// Fragments of this many characters or fewer are discarded.
pub const MIN_FRAGMENT_CHARS: usize = 5;

/// Scan `text` for literal spans and return the surviving fragments joined
/// with single spaces (each fragment followed by one space).
pub fn scan_literals(text: &str) -> String {
    let mut out = String::new();
    let mut kept = 0usize;
    let mut dropped = 0usize;

    for raw in literal_spans(text) {
        let fragment = clean_fragment(&decode_literal(raw));
        if is_text_fragment(&fragment) {
            out.push_str(&fragment);
            out.push(' ');
            kept += 1;
        } else {
            dropped += 1;
        }
    }

    trace!("literal scan: kept {} fragments, dropped {}", kept, dropped);
    out
}

/// Iterate over the raw (still escaped) contents of every `(...)` span.
///
/// Empty spans `()` are skipped. A span left open at end of input is dropped.
pub fn literal_spans(text: &str) -> impl Iterator<Item = &str> + '_ {
    let bytes = text.as_bytes();
    let mut pos = 0usize;

    std::iter::from_fn(move || {
        loop {
            let open = pos + bytes[pos..].iter().position(|&b| b == b'(')?;
            let start = open + 1;
            let mut i = start;
            let mut close = None;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' => i += 2,
                    b')' => {
                        close = Some(i);
                        break;
                    }
                    _ => i += 1,
                }
            }
            let close = close?;
            pos = close + 1;
            if close > start {
                // `(` and `)` are ASCII, so both ends are char boundaries.
                return Some(&text[start..close]);
            }
        }
    })
}

/// Decode the escape sequences of one literal's contents.
///
/// * `\ddd`: one to three octal digits, the byte value modulo 256
/// * `\n \r \t \b \f`: the corresponding control characters
/// * `\( \) \\`: the character itself
/// * backslash + end-of-line: line continuation, produces nothing
/// * any other `\x`: `x`
///
/// Decoded bytes map to `char` as Latin-1; the caller strips whatever is not
/// printable ASCII.
pub fn decode_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        match next {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            '0'..='7' => {
                let mut value = next as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&d @ '0'..='7') => {
                            value = value * 8 + (d as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(char::from((value & 0xFF) as u8));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' => {}
            other => out.push(other),
        }
    }

    out
}

/// Replace non-printable characters with spaces and collapse whitespace.
pub(crate) fn clean_fragment(decoded: &str) -> String {
    let printable: String = decoded
        .chars()
        .map(|c| if is_printable_ascii(c) { c } else { ' ' })
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_text_fragment(fragment: &str) -> bool {
    fragment.len() > MIN_FRAGMENT_CHARS
        && !STRUCTURAL_MARKERS.iter().any(|m| fragment.contains(m))
}

/// Printable ASCII: space through tilde.
pub(crate) fn is_printable_ascii(c: char) -> bool {
    matches!(c, ' '..='~')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_are_found_in_order() {
        let spans: Vec<_> = literal_spans("BT (Hello) Tj (World) Tj ET").collect();
        assert_eq!(spans, vec!["Hello", "World"]);
    }

    #[test]
    fn escaped_paren_does_not_close_span() {
        let spans: Vec<_> = literal_spans(r"(a \) b) Tj").collect();
        assert_eq!(spans, vec![r"a \) b"]);
    }

    #[test]
    fn unterminated_span_is_dropped() {
        let spans: Vec<_> = literal_spans("(complete) (never closed").collect();
        assert_eq!(spans, vec!["complete"]);
    }

    #[test]
    fn empty_spans_skipped() {
        let spans: Vec<_> = literal_spans("() (x)").collect();
        assert_eq!(spans, vec!["x"]);
    }

    #[test]
    fn octal_escapes_decode() {
        assert_eq!(decode_literal(r"\101\102"), "AB");
        assert_eq!(decode_literal(r"\(\101\102\)"), "(AB)");
        // Short octal forms are legal too.
        assert_eq!(decode_literal(r"\60x"), "0x");
    }

    #[test]
    fn named_escapes_decode() {
        assert_eq!(decode_literal(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(decode_literal(r"back\\slash"), r"back\slash");
        assert_eq!(decode_literal("line\\\ncontinued"), "linecontinued");
        assert_eq!(decode_literal(r"\q"), "q");
        assert_eq!(decode_literal("trailing\\"), "trailing");
    }

    #[test]
    fn fragment_cleanup_collapses_and_strips() {
        assert_eq!(clean_fragment("a\n\n b\u{7f}c"), "a b c");
        assert_eq!(clean_fragment("caf\u{e9} au lait"), "caf au lait");
    }

    #[test]
    fn short_and_structural_fragments_dropped() {
        let out = scan_literals("(short) (tiny) (1 0 obj) (A real sentence here)");
        assert_eq!(out, "A real sentence here ");
    }

    #[test]
    fn octal_text_survives_full_scan() {
        let out = scan_literals(r"BT (Matrix \(\101\102\) product) Tj ET");
        assert_eq!(out, "Matrix (AB) product ");
    }
}
