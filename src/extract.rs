//! Text-extraction collaborator boundary. The pipeline receives page-ordered
//! plain text; pulling that text out of PDF binary structure happens upstream
//! and is never parsed here.

use std::path::Path;

use anyhow::{Context, Result};

pub trait TextExtractor {
    /// Page-ordered concatenated plain text of the document at `path`.
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Reads documents whose text was already extracted upstream (plain-text
/// dumps of specification PDFs).
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

// ── Tests ──
