//! Tag normalization
//!
//! Oracle output is free text. Before it can be compared with the allowed
//! trade list it is collapsed to a canonical form, and anything that is not
//! an allowed trade is replaced by the fallback category.

use regex::Regex;

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_tag(raw: &str) -> String {
    lazy_static::lazy_static! {
        static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    }

    WHITESPACE_RE.replace_all(raw, " ").trim().to_string()
}

/// Normalize and check membership. `None` when the answer is off-list.
pub fn match_allowed<S: AsRef<str>>(raw: &str, allowed: &[S]) -> Option<String> {
    let normalized = normalize_tag(raw);
    allowed
        .iter()
        .any(|tag| tag.as_ref() == normalized)
        .then_some(normalized)
}

/// Normalize, substituting `fallback` for anything outside `allowed`
pub fn resolve_tag<S: AsRef<str>>(raw: &str, allowed: &[S], fallback: &str) -> String {
    match_allowed(raw, allowed).unwrap_or_else(|| fallback.to_string())
}
