pub mod classify;
pub mod metadata;
pub mod normalize;
pub mod sections;
pub mod sentences;

use crate::db::{DocType, RequirementRow};
use classify::Classifier;

pub struct ExtractedDoc {
    pub family: String,
    pub doc_type: DocType,
    pub records: Vec<RequirementRow>,
}

/// Full pipeline for one document: raw text → cadence sections → candidate
/// sentences → normalized, deduplicated rows tagged with document metadata.
/// Never fails: malformed or markerless text degrades to zero records.
pub fn process_document(text: &str, classifier: &Classifier) -> ExtractedDoc {
    let meta = metadata::extract(text);
    let mut dedup = normalize::PassDedup::new();
    let mut records = Vec::new();

    for section in sections::split_cadences(text) {
        for candidate in classifier.candidates(&section.text) {
            let description = normalize::normalize(candidate);
            if description.is_empty() {
                continue;
            }
            if !dedup.admit(&section.cadence, &description) {
                continue;
            }
            records.push(RequirementRow {
                family: meta.family.clone(),
                req_type: meta.doc_type,
                cadence: section.cadence.clone(),
                description,
            });
        }
    }

    ExtractedDoc {
        family: meta.family,
        doc_type: meta.doc_type,
        records,
    }
}

// ── Tests ──
