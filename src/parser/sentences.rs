//! Sentence-boundary collaborator. Splits prose on terminal punctuation into
//! grammatically plausible sentences; its accuracy on malformed PDF reflow
//! text is a given, not something corrected downstream.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.?!]+[.?!]+").unwrap());

/// Sentences of `block` in appearance order. A trailing run with no terminal
/// punctuation is still yielded as a final sentence.
pub fn split(block: &str) -> impl Iterator<Item = &str> + '_ {
    let tail = SENTENCE_RE
        .find_iter(block)
        .last()
        .map_or(block, |m| &block[m.end()..]);

    SENTENCE_RE
        .find_iter(block)
        .map(|m| m.as_str())
        .chain(std::iter::once(tail))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ── Tests ──
