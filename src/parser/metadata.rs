use std::sync::LazyLock;

use regex::Regex;

use crate::db::DocType;

pub const DEFAULT_FAMILY: &str = "REQ";

static FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Legacy GUID|\bID):\s*([A-Za-z0-9_\-]+)").unwrap());
static INFO_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)information\s+only").unwrap());

/// Document-level tags applied uniformly to every record extracted in one
/// ingestion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMeta {
    pub family: String,
    pub doc_type: DocType,
}

pub fn extract(text: &str) -> DocMeta {
    let family = FAMILY_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| DEFAULT_FAMILY.to_string());

    let doc_type = if INFO_ONLY_RE.is_match(text) {
        DocType::InformationOnly
    } else {
        DocType::Requirement
    };

    DocMeta { family, doc_type }
}

// ── Tests ──
