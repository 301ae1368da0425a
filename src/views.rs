//! Read-only reshapes of the stored record set: the review pivot and the
//! positional export matrix. Both are pure functions of a snapshot.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::db::StoredRecord;
use crate::parser::metadata::DEFAULT_FAMILY;

pub struct PivotView {
    pub cadences: Vec<String>,
    pub rows: Vec<PivotRow>,
}

pub struct PivotRow {
    pub seq: usize,
    /// One cell per cadence column; only the record's own column is filled.
    pub cells: Vec<String>,
    pub priority: String,
    pub owner: String,
    pub status: String,
    pub module: String,
    /// Case-insensitive repeat of (description, cadence) earlier in the view.
    /// Weaker than the storage key on purpose: it surfaces near-duplicates
    /// for human review without preventing their storage.
    pub duplicate: bool,
}

pub fn sorted_cadences(records: &[StoredRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records.iter().map(|r| r.cadence.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// One row per stored record in insertion order, one column per cadence.
pub fn build_pivot(records: &[StoredRecord]) -> PivotView {
    let cadences = sorted_cadences(records);
    let mut seen: HashSet<(String, String)> = HashSet::new();

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let duplicate = !seen.insert((r.description.to_lowercase(), r.cadence.clone()));
            let cells = cadences
                .iter()
                .map(|c| {
                    if *c == r.cadence {
                        r.description.clone()
                    } else {
                        String::new()
                    }
                })
                .collect();
            PivotRow {
                seq: i + 1,
                cells,
                priority: r.priority.clone(),
                owner: r.owner.clone(),
                status: r.status.clone(),
                module: r.module.clone(),
                duplicate,
            }
        })
        .collect();

    PivotView { cadences, rows }
}

/// Positional download table: header `["Requirement ID", cadences...]`, then
/// one row per index up to the longest cadence's count. Row alignment is
/// purely positional; requirements sharing a row are not necessarily related.
pub fn build_export_matrix(records: &[StoredRecord], family: &str) -> Vec<Vec<String>> {
    let cadences = sorted_cadences(records);

    let mut by_cadence: HashMap<&str, Vec<&str>> = HashMap::new();
    for r in records {
        by_cadence
            .entry(r.cadence.as_str())
            .or_default()
            .push(r.description.as_str());
    }

    let max_rows = by_cadence.values().map(Vec::len).max().unwrap_or(0);

    let mut header = vec!["Requirement ID".to_string()];
    header.extend(cadences.iter().cloned());

    let mut rows = Vec::with_capacity(max_rows + 1);
    rows.push(header);

    for i in 0..max_rows {
        let mut row = vec![format!("{}-{:03}", family, i + 1)];
        for cadence in &cadences {
            row.push(
                by_cadence[cadence.as_str()]
                    .get(i)
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            );
        }
        rows.push(row);
    }

    rows
}

/// Family used for synthesized export IDs when none is given explicitly: the
/// store's single family if there is exactly one, otherwise the default.
pub fn export_family(records: &[StoredRecord]) -> String {
    let set: BTreeSet<&str> = records.iter().map(|r| r.family.as_str()).collect();
    if set.len() == 1 {
        set.into_iter().next().unwrap().to_string()
    } else {
        DEFAULT_FAMILY.to_string()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocType;

    fn rec(id: i64, family: &str, cadence: &str, description: &str) -> StoredRecord {
        StoredRecord {
            id,
            family: family.to_string(),
            req_type: DocType::Requirement,
            cadence: cadence.to_string(),
            description: description.to_string(),
            priority: String::new(),
            owner: String::new(),
            status: String::new(),
            module: String::new(),
        }
    }

    #[test]
    fn pivot_places_description_under_own_cadence() {
        let records = vec![
            rec(1, "REQ", "2.0", "Second cadence req."),
            rec(2, "REQ", "1.0", "First cadence req."),
        ];
        let view = build_pivot(&records);
        assert_eq!(view.cadences, vec!["1.0", "2.0"]);

        assert_eq!(view.rows[0].seq, 1);
        assert_eq!(view.rows[0].cells, vec!["", "Second cadence req."]);
        assert_eq!(view.rows[1].cells, vec!["First cadence req.", ""]);
    }

    #[test]
    fn pivot_flags_case_insensitive_duplicates() {
        let records = vec![
            rec(1, "REQ", "1.0", "The pump SHALL start."),
            rec(2, "REQ", "1.0", "The pump shall start."),
            rec(3, "REQ", "2.0", "The pump shall start."),
        ];
        let view = build_pivot(&records);
        assert!(!view.rows[0].duplicate);
        assert!(view.rows[1].duplicate);
        // Different cadence is not a duplicate.
        assert!(!view.rows[2].duplicate);
    }

    #[test]
    fn export_matrix_positional_alignment() {
        let records = vec![
            rec(1, "SYS", "1.0", "First of 1.0."),
            rec(2, "SYS", "1.0", "Second of 1.0."),
            rec(3, "SYS", "2.0", "Only one of 2.0."),
        ];
        let matrix = build_export_matrix(&records, "SYS");
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0], vec!["Requirement ID", "1.0", "2.0"]);
        assert_eq!(matrix[1], vec!["SYS-001", "First of 1.0.", "Only one of 2.0."]);
        assert_eq!(matrix[2], vec!["SYS-002", "Second of 1.0.", ""]);
    }

    #[test]
    fn export_matrix_of_empty_store_is_header_only() {
        let matrix = build_export_matrix(&[], "REQ");
        assert_eq!(matrix, vec![vec!["Requirement ID".to_string()]]);
    }

    #[test]
    fn export_family_selection() {
        let one = vec![rec(1, "SYS", "1.0", "A.")];
        assert_eq!(export_family(&one), "SYS");

        let mixed = vec![rec(1, "SYS", "1.0", "A."), rec(2, "OTH", "1.0", "B.")];
        assert_eq!(export_family(&mixed), DEFAULT_FAMILY);

        assert_eq!(export_family(&[]), DEFAULT_FAMILY);
    }
}
