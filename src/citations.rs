//! Law citation marking and extraction.
//!
//! Reports cite Swiss Code of Obligations articles in several spellings:
//! `Art. 257 CO`, `Art 267a CO`, `OR Art. 259b`, `Art. 268 OR`. During report
//! generation every citation is wrapped in the recognized `**…**` syntax so a
//! frontend can make it interactive; resolving an article to an explanation
//! is the lookup collaborator's job.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CitationError {
    #[error("citation lookup unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a legal-article token (e.g. "Art. 267 CO") to explanatory text.
pub trait CitationLookup {
    fn explain(&self, article: &str) -> Result<String, CitationError>;
}

fn bare_citation() -> Regex {
    Regex::new(r"(?i)\b((?:OR\s+)?Art\.?\s*\d+[a-z]?(?:\s+(?:CO|OR))?)\b").unwrap()
}

fn marked_citation() -> Regex {
    Regex::new(r"(?i)\*\*(?:OR\s+)?Art\.?\s*\d+[a-z]?(?:\s+(?:CO|OR))?\*\*").unwrap()
}

/// Wrap every bare citation in `**…**`. Already-marked citations are left
/// untouched, so the function is idempotent.
pub fn mark_citations(text: &str) -> String {
    let marked = marked_citation();
    let bare = bare_citation();

    let mut out = String::with_capacity(text.len() + 16);
    let mut cursor = 0;
    for m in marked.find_iter(text) {
        let gap = &text[cursor..m.start()];
        out.push_str(&bare.replace_all(gap, "**$1**"));
        out.push_str(m.as_str());
        cursor = m.end();
    }
    out.push_str(&bare.replace_all(&text[cursor..], "**$1**"));
    out
}

/// List cited article tokens in order of first appearance, deduplicated.
pub fn extract_citations(text: &str) -> Vec<String> {
    let bare = bare_citation();
    let mut seen: Vec<String> = Vec::new();
    for m in bare.find_iter(text) {
        let normalized = normalize_token(m.as_str());
        if !seen.iter().any(|s| *s == normalized) {
            seen.push(normalized);
        }
    }
    seen
}

/// Collapse whitespace runs so "Art.  257   CO" and "Art. 257 CO" dedupe.
fn normalize_token(token: &str) -> String {
    token.split_whitespace().collect::<Vec<_>>().join(" ")
}
