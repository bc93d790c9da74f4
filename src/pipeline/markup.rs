//! Markup normalisation: LLM output → display-safe HTML.
//!
//! Chat models answer in a loose markdown dialect and some of them (reasoning
//! models in particular) prepend a `<think>…</think>` trace of their
//! deliberation. This module removes the trace and converts the small subset
//! of markdown the prompts ask for into HTML that can be inserted into a page
//! as-is.
//!
//! ## Rule order
//!
//! Every conversion is a named [`Rule`] in [`RULES`], applied in order:
//!
//! | # | Rule | Requires |
//! |---|------|----------|
//! | 1 | reasoning removal + line endings | |
//! | – | HTML escaping (optional) | reasoning already gone, no tags produced yet |
//! | 2 | headings | |
//! | 3 | emphasis | headings done, so `###` is never read as emphasis |
//! | 4 | list items | emphasis done, so `* item` is a list marker |
//! | 5 | code | fenced blocks first, then inline backticks |
//! | 6 | links | |
//! | 7 | line breaks | every block-level tag already produced |
//! | 8 | paragraphs | one line per block or paragraph |
//! | 9 | cleanup | |
//!
//! Steps 1, the escape pass, and 9 depend on [`MarkupOptions`] and run outside
//! the table. Markdown inside code fences is still subject to rules 2–4.
//! Emphasis also runs before links, so asterisks inside a link target are
//! converted too: `[d](https://x.test/a*b*c)` gets an `<em>` in its `href`.

use crate::config::{ListWrap, MarkupOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Opening marker of a reasoning span.
pub const REASONING_OPEN: &str = "<think>";

/// Closing marker of a reasoning span.
pub const REASONING_CLOSE: &str = "</think>";

/// One string-to-string conversion step.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// Option-independent rules 2–8, in application order.
pub const RULES: [Rule; 7] = [
    Rule { name: "headings", apply: convert_headings },
    Rule { name: "emphasis", apply: convert_emphasis },
    Rule { name: "list_items", apply: convert_list_items },
    Rule { name: "code", apply: convert_code },
    Rule { name: "links", apply: convert_links },
    Rule { name: "line_breaks", apply: convert_line_breaks },
    Rule { name: "paragraphs", apply: wrap_paragraphs },
];

/// Render one LLM response with the default [`MarkupOptions`].
pub fn render_html(input: &str) -> String {
    render_html_with(input, &MarkupOptions::default())
}

/// Render one LLM response to HTML.
///
/// Pure and infallible: anything no rule recognises ends up as paragraph text.
pub fn render_html_with(input: &str, opts: &MarkupOptions) -> String {
    let mut s = strip_reasoning(input);
    if opts.escape_html {
        s = escape_html(&s);
    }
    for rule in &RULES {
        s = (rule.apply)(&s);
    }
    let html = cleanup(&s, opts.list_wrap);
    debug!("Rendered {} chars of model output → {} chars HTML", input.len(), html.len());
    html
}

// ── Rule 1: Remove reasoning spans ───────────────────────────────────────────

static RE_REASONING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

/// Remove every `<think>…</think>` span, normalise line endings, and trim.
///
/// Unpaired markers are handled too: a stray closing marker drops everything
/// before it (templates that pre-open the span), a stray opening marker drops
/// everything after it (generation cut off by the token limit).
pub fn strip_reasoning(input: &str) -> String {
    let normalised = normalise_line_endings(input);
    let without_spans = RE_REASONING.replace_all(&normalised, "");
    let mut rest: &str = &without_spans;
    if let Some(i) = rest.rfind(REASONING_CLOSE) {
        rest = &rest[i + REASONING_CLOSE.len()..];
    }
    if let Some(i) = rest.find(REASONING_OPEN) {
        rest = &rest[..i];
    }
    rest.trim().to_string()
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Escaping ─────────────────────────────────────────────────────────────────

/// Entity-escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Rule 2: Headings ─────────────────────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,3}) (.*)$").unwrap());

fn convert_headings(input: &str) -> String {
    RE_HEADING
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", caps[2].trim_end())
        })
        .to_string()
}

// ── Rule 3: Emphasis ─────────────────────────────────────────────────────────

// A strong span may contain complete `*em*` spans, so `**a *b* c**` nests.
static RE_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*((?:[^*\n]|\*[^*\n]+?\*)+?)\*\*").unwrap());

// The opening and closing asterisk must hug the text, so a `* ` list marker
// or an arithmetic `2 * 3` never opens an emphasis span.
static RE_EM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^\s*](?:[^*\n]*[^\s*])?)\*").unwrap());

fn convert_emphasis(input: &str) -> String {
    let s = RE_STRONG.replace_all(input, "<strong>$1</strong>");
    RE_EM.replace_all(&s, "<em>$1</em>").to_string()
}

// ── Rule 4: List items ───────────────────────────────────────────────────────

static RE_LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[*-]|\d+\.)[ \t]+(.*)$").unwrap());

fn convert_list_items(input: &str) -> String {
    RE_LIST_ITEM.replace_all(input, "<li>$1</li>").to_string()
}

// ── Rule 5: Code ─────────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_+.-]*)[ \t]*\n?(.*?)```").unwrap());

static RE_INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

/// Fenced blocks become one-line `<pre><code>` elements; their newlines are
/// kept as `&#10;` so the line-break rules leave the block alone.
fn convert_code(input: &str) -> String {
    let fenced = RE_FENCE.replace_all(input, |caps: &regex::Captures<'_>| {
        let lang = &caps[1];
        let body = caps[2].trim_end_matches('\n').replace('\n', "&#10;");
        if lang.is_empty() {
            format!("<pre><code>{body}</code></pre>")
        } else {
            format!("<pre><code class=\"language-{lang}\">{body}</code></pre>")
        }
    });
    RE_INLINE_CODE
        .replace_all(&fenced, "<code>$1</code>")
        .to_string()
}

// ── Rule 6: Links ────────────────────────────────────────────────────────────

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

fn convert_links(input: &str) -> String {
    RE_LINK
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let label = &caps[1];
            let url = &caps[2];
            if is_safe_url(url) {
                format!(
                    "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>"
                )
            } else {
                label.to_string()
            }
        })
        .to_string()
}

/// http(s), mailto, and scheme-less relative URLs.
fn is_safe_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        return true;
    }
    // No scheme at all: a colon may only appear after a path, query or fragment starts.
    match lower.find(':') {
        None => true,
        Some(colon) => lower[..colon].contains(['/', '?', '#']),
    }
}

// ── Rule 7: Line breaks ──────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

static RE_BLOCK_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(?:h[1-6]|p|ul|ol|li|pre)[ >]").unwrap());

fn is_block_level(line: &str) -> bool {
    RE_BLOCK_START.is_match(line)
}

/// Blank lines separate paragraphs; within a paragraph, consecutive text
/// lines are joined with `<br>`. Block-level lines stay on a line of their own.
fn convert_line_breaks(input: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for block in RE_BLANK_LINES.split(input) {
        let mut inline: Vec<&str> = Vec::new();
        for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if is_block_level(line) {
                flush_inline(&mut inline, &mut out);
                out.push(line.to_string());
            } else {
                inline.push(line);
            }
        }
        flush_inline(&mut inline, &mut out);
    }
    out.join("\n")
}

fn flush_inline(inline: &mut Vec<&str>, out: &mut Vec<String>) {
    if !inline.is_empty() {
        out.push(inline.join("<br>"));
        inline.clear();
    }
}

// ── Rule 8: Paragraphs ───────────────────────────────────────────────────────

fn wrap_paragraphs(input: &str) -> String {
    input
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| {
            if is_block_level(l) {
                l.to_string()
            } else {
                format!("<p>{l}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 9: Cleanup ──────────────────────────────────────────────────────────

static RE_BR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:<br>\s*){2,}").unwrap());

static RE_EMPTY_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<p>(?:\s|<br>)*</p>").unwrap());

/// Remove empty paragraphs, turn `<br>` runs into paragraph boundaries, and
/// wrap list items in `<ul>`. Running it twice changes nothing.
pub fn cleanup(input: &str, wrap: ListWrap) -> String {
    // Removing an empty paragraph can make two `<br>` adjacent and collapsing
    // a run can leave an empty paragraph behind, so iterate to a fixpoint.
    // Every change shortens the string, which bounds the loop.
    let mut s = input.to_string();
    loop {
        let collapsed = RE_BR_RUN.replace_all(&s, "</p><p>");
        let next = RE_EMPTY_PARAGRAPH.replace_all(&collapsed, "").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    wrap_lists(&lines, wrap).join("\n").trim().to_string()
}

fn wrap_lists(lines: &[&str], wrap: ListWrap) -> Vec<String> {
    // Under `FirstRun`, an existing container means the first run was wrapped
    // by an earlier pass.
    let mut budget_spent =
        wrap == ListWrap::FirstRun && lines.iter().any(|l| l.starts_with("<ul>"));
    let mut out = Vec::with_capacity(lines.len());
    let mut run: Vec<&str> = Vec::new();

    let mut flush = |run: &mut Vec<&str>, out: &mut Vec<String>| {
        if run.is_empty() {
            return;
        }
        if wrap == ListWrap::FirstRun && budget_spent {
            out.extend(run.iter().map(|l| l.to_string()));
        } else {
            out.push(format!("<ul>{}</ul>", run.concat()));
            budget_spent = true;
        }
        run.clear();
    };

    for &line in lines {
        if line.starts_with("<li>") {
            run.push(line);
        } else {
            flush(&mut run, &mut out);
            out.push(line.to_string());
        }
    }
    flush(&mut run, &mut out);
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_opts() -> MarkupOptions {
        MarkupOptions {
            escape_html: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_reasoning_spans() {
        let input = "<think>plan\nmore plan</think>Answer<think>again</think> here";
        assert_eq!(strip_reasoning(input), "Answer here");
    }

    #[test]
    fn test_strip_dangling_markers() {
        assert_eq!(strip_reasoning("pre-opened reasoning</think>\nFinal"), "Final");
        assert_eq!(strip_reasoning("Final answer\n<think>cut off"), "Final answer");
    }

    #[test]
    fn test_strip_normalises_crlf() {
        assert_eq!(strip_reasoning("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_headings_levels() {
        assert_eq!(convert_headings("# A\n## B\n### C"), "<h1>A</h1>\n<h2>B</h2>\n<h3>C</h3>");
        // Four markers is not a heading this renderer knows.
        assert_eq!(convert_headings("#### D"), "#### D");
        assert_eq!(convert_headings("#NoSpace"), "#NoSpace");
    }

    #[test]
    fn test_heading_before_emphasis() {
        assert_eq!(render_html("### Title"), "<h3>Title</h3>");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            convert_emphasis("**bold** and *it*"),
            "<strong>bold</strong> and <em>it</em>"
        );
        assert_eq!(convert_emphasis("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(convert_emphasis("* item *x*"), "* item <em>x</em>");
    }

    #[test]
    fn test_nested_emphasis() {
        assert_eq!(
            render_html("**bold *and* italic**"),
            "<p><strong>bold <em>and</em> italic</strong></p>"
        );
        assert_eq!(
            convert_emphasis("**a** then **b**"),
            "<strong>a</strong> then <strong>b</strong>"
        );
        assert_eq!(convert_emphasis("***x***"), "<strong><em>x</em></strong>");
    }

    #[test]
    fn test_emphasis_runs_before_links() {
        let out = render_html("[docs](https://x.test/a*b*c)");
        assert!(out.contains("href=\"https://x.test/a<em>b</em>c\""), "{out}");
    }

    #[test]
    fn test_list_items() {
        assert_eq!(
            convert_list_items("* a\n- b\n12. c\n  - nested"),
            "<li>a</li>\n<li>b</li>\n<li>c</li>\n<li>nested</li>"
        );
        assert_eq!(convert_list_items("---"), "---");
    }

    #[test]
    fn test_fenced_code_before_inline() {
        let out = convert_code("```rust\nlet x = 1;\nlet y = 2;\n```\nuse `x`");
        assert_eq!(
            out,
            "<pre><code class=\"language-rust\">let x = 1;&#10;let y = 2;</code></pre>\nuse <code>x</code>"
        );
    }

    #[test]
    fn test_link_attributes() {
        assert_eq!(
            convert_links("[click](http://x.test)"),
            "<a href=\"http://x.test\" target=\"_blank\" rel=\"noopener noreferrer\">click</a>"
        );
    }

    #[test]
    fn test_unsafe_link_scheme_dropped() {
        assert_eq!(convert_links("[x](javascript:alert(1))"), "x)");
        assert_eq!(convert_links("[home](/index.html)"), "<a href=\"/index.html\" target=\"_blank\" rel=\"noopener noreferrer\">home</a>");
    }

    #[test]
    fn test_line_breaks_and_paragraphs() {
        let s = convert_line_breaks("one\ntwo\n\nthree\n<h2>H</h2>\nfour");
        assert_eq!(s, "one<br>two\nthree\n<h2>H</h2>\nfour");
        assert_eq!(
            wrap_paragraphs(&s),
            "<p>one<br>two</p>\n<p>three</p>\n<h2>H</h2>\n<p>four</p>"
        );
    }

    #[test]
    fn test_cleanup_removes_empty_and_collapses_breaks() {
        assert_eq!(cleanup("<p></p>\n<p><br></p>\n<p>a</p>", ListWrap::EveryRun), "<p>a</p>");
        assert_eq!(cleanup("<p>a<br><br>b</p>", ListWrap::EveryRun), "<p>a</p><p>b</p>");
        assert_eq!(cleanup("<p><br><br></p>", ListWrap::EveryRun), "");
    }

    #[test]
    fn test_cleanup_fixpoint() {
        let input = "<p>a<br><p></p><br>b</p>";
        let once = cleanup(input, ListWrap::EveryRun);
        assert_eq!(once, "<p>a</p><p>b</p>");
        assert_eq!(cleanup(&once, ListWrap::EveryRun), once);
    }

    #[test]
    fn test_every_list_run_wrapped() {
        let out = render_html("- a\n- b\n\nText\n\n1. c\n2. d");
        assert_eq!(
            out,
            "<ul><li>a</li><li>b</li></ul>\n<p>Text</p>\n<ul><li>c</li><li>d</li></ul>"
        );
    }

    #[test]
    fn test_first_list_run_only() {
        let opts = MarkupOptions {
            list_wrap: ListWrap::FirstRun,
            ..Default::default()
        };
        let out = render_html_with("- a\n\nText\n\n- b", &opts);
        assert_eq!(out, "<ul><li>a</li></ul>\n<p>Text</p>\n<li>b</li>");
        assert_eq!(cleanup(&out, ListWrap::FirstRun), out);
    }

    #[test]
    fn test_think_and_strong_end_to_end() {
        let out = render_html("<think>internal</think>**Result:** done");
        assert_eq!(out, "<p><strong>Result:</strong> done</p>");
        assert!(!out.contains("internal"));
    }

    #[test]
    fn test_script_is_escaped() {
        let out = render_html("<script>alert(1)</script>");
        assert_eq!(out, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn test_raw_mode_keeps_model_html() {
        let out = render_html_with("<p>already html</p>", &raw_opts());
        assert_eq!(out, "<p>already html</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_html(""), "");
        assert_eq!(render_html("<think>only thoughts</think>"), "");
    }

    #[test]
    fn test_full_answer() {
        let input = "<think>\nlet me see\n</think>\n\n## Findings\n\nThe model uses **attention**.\nSee [paper](https://arxiv.org/abs/1706.03762).\n\n- fast\n- `parallel`\n";
        let out = render_html(input);
        assert_eq!(
            out,
            "<h2>Findings</h2>\n\
             <p>The model uses <strong>attention</strong>.<br>See <a href=\"https://arxiv.org/abs/1706.03762\" target=\"_blank\" rel=\"noopener noreferrer\">paper</a>.</p>\n\
             <ul><li>fast</li><li><code>parallel</code></li></ul>"
        );
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["headings", "emphasis", "list_items", "code", "links", "line_breaks", "paragraphs"]
        );
    }
}
