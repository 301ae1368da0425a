use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS requirements (
            id          INTEGER PRIMARY KEY,
            family      TEXT NOT NULL,
            req_type    TEXT NOT NULL CHECK(req_type IN ('Requirement','InformationOnly')),
            cadence     TEXT NOT NULL,
            description TEXT NOT NULL CHECK(length(description) > 0),
            priority    TEXT NOT NULL DEFAULT '',
            owner       TEXT NOT NULL DEFAULT '',
            status      TEXT NOT NULL DEFAULT '',
            module      TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(family, cadence, description)
        );
        CREATE INDEX IF NOT EXISTS idx_requirements_cadence ON requirements(cadence);
        CREATE INDEX IF NOT EXISTS idx_requirements_family ON requirements(family);
        ",
    )?;
    Ok(())
}

/// Document-wide classification: a document marked "information only"
/// contributes InformationOnly rows, everything else is Requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocType {
    Requirement,
    InformationOnly,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Requirement => "Requirement",
            DocType::InformationOnly => "InformationOnly",
        }
    }

    pub fn from_db(s: &str) -> Self {
        if s == "InformationOnly" {
            DocType::InformationOnly
        } else {
            DocType::Requirement
        }
    }
}

/// One extracted statement, ready for insertion. Annotation fields start
/// empty and are only ever set through `update_annotations`.
#[derive(Debug, Clone)]
pub struct RequirementRow {
    pub family: String,
    pub req_type: DocType,
    pub cadence: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub family: String,
    pub req_type: DocType,
    pub cadence: String,
    pub description: String,
    pub priority: String,
    pub owner: String,
    pub status: String,
    pub module: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert one document's rows in a single transaction with insert-if-absent
/// semantics on (family, cadence, description). Rows whose key already exists
/// are skipped, leaving previously set annotation fields untouched, so
/// re-ingesting the same document is idempotent. Any hard failure rolls back
/// the whole batch.
pub fn insert_records(conn: &Connection, rows: &[RequirementRow]) -> Result<InsertOutcome> {
    let tx = conn.unchecked_transaction()?;
    let mut outcome = InsertOutcome::default();
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO requirements (family, req_type, cadence, description)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in rows {
            let n = stmt.execute(rusqlite::params![
                r.family,
                r.req_type.as_str(),
                r.cadence,
                r.description,
            ])?;
            if n == 1 {
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }
    }
    tx.commit()?;
    Ok(outcome)
}

/// All stored records in insertion order.
pub fn fetch_all(conn: &Connection) -> Result<Vec<StoredRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, family, req_type, cadence, description, priority, owner, status, module
         FROM requirements ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                family: row.get(1)?,
                req_type: DocType::from_db(&row.get::<_, String>(2)?),
                cadence: row.get(3)?,
                description: row.get(4)?,
                priority: row.get(5)?,
                owner: row.get(6)?,
                status: row.get(7)?,
                module: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Sorted cadence labels and the record count under each, straight off the
/// table. Feeds the chart payload without running any pipeline code.
pub fn cadence_counts(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT cadence, COUNT(*) FROM requirements GROUP BY cadence ORDER BY cadence",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn distinct_families(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT family FROM requirements ORDER BY family")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Which stored record(s) an annotation edit applies to. Edits are keyed by
/// row id or by the full uniqueness triple, never by description alone: the
/// same description can legitimately appear under several cadences.
#[derive(Debug, Clone)]
pub enum UpdateKey {
    Id(i64),
    Triple {
        family: String,
        cadence: String,
        description: String,
    },
}

#[derive(Debug, Default, Clone)]
pub struct AnnotationUpdate {
    pub priority: Option<String>,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub module: Option<String>,
}

impl AnnotationUpdate {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
            && self.owner.is_none()
            && self.status.is_none()
            && self.module.is_none()
    }
}

/// Set annotation fields on the matching record. Returns the number of rows
/// changed; a missing key is a no-op, not an error.
pub fn update_annotations(
    conn: &Connection,
    key: &UpdateKey,
    update: &AnnotationUpdate,
) -> Result<usize> {
    if update.is_empty() {
        return Ok(0);
    }

    let mut sets = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    for (column, value) in [
        ("priority", &update.priority),
        ("owner", &update.owner),
        ("status", &update.status),
        ("module", &update.module),
    ] {
        if let Some(v) = value {
            sets.push(format!("{} = ?{}", column, params.len() + 1));
            params.push(Box::new(v.clone()));
        }
    }

    let where_clause = match key {
        UpdateKey::Id(id) => {
            params.push(Box::new(*id));
            format!("id = ?{}", params.len())
        }
        UpdateKey::Triple {
            family,
            cadence,
            description,
        } => {
            params.push(Box::new(family.clone()));
            params.push(Box::new(cadence.clone()));
            params.push(Box::new(description.clone()));
            format!(
                "family = ?{} AND cadence = ?{} AND description = ?{}",
                params.len() - 2,
                params.len() - 1,
                params.len()
            )
        }
    };

    let sql = format!(
        "UPDATE requirements SET {} WHERE {}",
        sets.join(", "),
        where_clause
    );
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, param_refs.as_slice())?;
    Ok(changed)
}

// ── Stats ──

pub struct Stats {
    pub records: usize,
    pub cadences: usize,
    pub families: usize,
    pub info_only: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let records: usize = conn.query_row("SELECT COUNT(*) FROM requirements", [], |r| r.get(0))?;
    let cadences: usize = conn.query_row(
        "SELECT COUNT(DISTINCT cadence) FROM requirements",
        [],
        |r| r.get(0),
    )?;
    let families: usize = conn.query_row(
        "SELECT COUNT(DISTINCT family) FROM requirements",
        [],
        |r| r.get(0),
    )?;
    let info_only: usize = conn.query_row(
        "SELECT COUNT(*) FROM requirements WHERE req_type = 'InformationOnly'",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        records,
        cadences,
        families,
        info_only,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn row(family: &str, cadence: &str, description: &str) -> RequirementRow {
        RequirementRow {
            family: family.to_string(),
            req_type: DocType::Requirement,
            cadence: cadence.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn insert_is_idempotent() {
        let conn = mem_conn();
        let rows = vec![
            row("REQ", "1.0", "The system shall log events."),
            row("REQ", "2.0", "The system shall respond."),
        ];
        let first = insert_records(&conn, &rows).unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped, 0);

        let second = insert_records(&conn, &rows).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(fetch_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn same_description_different_cadence_both_kept() {
        let conn = mem_conn();
        let rows = vec![
            row("REQ", "1.0", "The system shall respond."),
            row("REQ", "2.0", "The system shall respond."),
        ];
        let outcome = insert_records(&conn, &rows).unwrap();
        assert_eq!(outcome.inserted, 2);
    }

    #[test]
    fn failed_batch_rolls_back_without_touching_earlier_batches() {
        let conn = mem_conn();
        insert_records(&conn, &[row("A", "1.0", "First doc requirement.")]).unwrap();

        // Empty description violates the table CHECK; the whole second batch
        // must roll back while the first document's rows stay queryable.
        let bad = vec![row("B", "1.0", "Good row."), row("B", "1.0", "")];
        assert!(insert_records(&conn, &bad).is_err());

        let all = fetch_all(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].family, "A");
    }

    #[test]
    fn annotations_survive_reingestion() {
        let conn = mem_conn();
        let rows = vec![row("REQ", "1.0", "The system shall log events.")];
        insert_records(&conn, &rows).unwrap();

        let id = fetch_all(&conn).unwrap()[0].id;
        let changed = update_annotations(
            &conn,
            &UpdateKey::Id(id),
            &AnnotationUpdate {
                priority: Some("High".to_string()),
                owner: Some("QA".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(changed, 1);

        insert_records(&conn, &rows).unwrap();
        let rec = &fetch_all(&conn).unwrap()[0];
        assert_eq!(rec.priority, "High");
        assert_eq!(rec.owner, "QA");
        assert_eq!(rec.status, "");
    }

    #[test]
    fn update_by_triple() {
        let conn = mem_conn();
        insert_records(
            &conn,
            &[
                row("REQ", "1.0", "The system shall respond."),
                row("REQ", "2.0", "The system shall respond."),
            ],
        )
        .unwrap();

        let changed = update_annotations(
            &conn,
            &UpdateKey::Triple {
                family: "REQ".to_string(),
                cadence: "2.0".to_string(),
                description: "The system shall respond.".to_string(),
            },
            &AnnotationUpdate {
                status: Some("Reviewed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(changed, 1);

        let all = fetch_all(&conn).unwrap();
        assert_eq!(all[0].status, "");
        assert_eq!(all[1].status, "Reviewed");
    }

    #[test]
    fn update_missing_key_is_noop() {
        let conn = mem_conn();
        let changed = update_annotations(
            &conn,
            &UpdateKey::Id(42),
            &AnnotationUpdate {
                priority: Some("Low".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn update_with_no_fields_is_noop() {
        let conn = mem_conn();
        insert_records(&conn, &[row("REQ", "1.0", "The system shall respond.")]).unwrap();
        let changed =
            update_annotations(&conn, &UpdateKey::Id(1), &AnnotationUpdate::default()).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn cadence_counts_sorted() {
        let conn = mem_conn();
        insert_records(
            &conn,
            &[
                row("REQ", "2.0", "Second cadence req."),
                row("REQ", "1.0", "First cadence req."),
                row("REQ", "1.0", "Another first cadence req."),
            ],
        )
        .unwrap();
        let counts = cadence_counts(&conn).unwrap();
        assert_eq!(counts, vec![("1.0".to_string(), 2), ("2.0".to_string(), 1)]);
    }
}
