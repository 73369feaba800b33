//! Markup stripping for source documents.
//!
//! The LaTeX normalizer is a best-effort stripper: good enough for embeddings,
//! never an error. Math content is kept, only its delimiters are dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::traits::Normalizer;

const BEGIN_DOCUMENT: &str = "\\begin{document}";
const END_DOCUMENT: &str = "\\end{document}";

static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%.*").expect("Invalid comment regex pattern"));

// `\command`, `\command*`, `\command[opt]`; the `{arg}` braces are dropped separately.
static CONTROL_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\[a-zA-Z]+\*?\s*(\[[^\]]*\])?").expect("Invalid control token regex pattern")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex pattern"));

#[derive(Debug, Clone, Copy, Default)]
pub struct LatexNormalizer;

impl LatexNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for LatexNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let text = LINE_COMMENT.replace_all(raw, "");
        let body = document_body(&text);
        let body = body.replace('~', " ").replace("$$", " ").replace('$', " ");
        let body = CONTROL_TOKEN.replace_all(&body, " ");
        let body = body.replace(['{', '}'], " ");
        collapse_whitespace(&body)
    }
}

/// Whitespace-only normalization for sources without markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextNormalizer;

impl Normalizer for PlainTextNormalizer {
    fn normalize(&self, raw: &str) -> String {
        collapse_whitespace(raw)
    }
}

/// Restricts `text` to the region between the document markers. Each marker
/// applies on its own; a missing marker leaves that end of the text open.
fn document_body(text: &str) -> &str {
    let start = text.find(BEGIN_DOCUMENT).map_or(0, |i| i + BEGIN_DOCUMENT.len());
    let end = text.find(END_DOCUMENT).unwrap_or(text.len());
    if end < start {
        return "";
    }
    &text[start..end]
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
