use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// Timestamped default output name, one file per export.
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "requirements_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Write a two-dimensional table as CSV. Fields containing the delimiter,
/// quotes, or newlines are quoted per RFC 4180.
pub fn write_matrix(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let mut out = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        let line = row
            .iter()
            .map(|f| csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ── Tests ──
