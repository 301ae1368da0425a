mod db;
mod export;
mod extract;
mod parser;
mod views;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::extract::TextExtractor;
use crate::parser::classify::{Classifier, Granularity, Policy};

#[derive(Parser)]
#[command(
    name = "reqscan",
    about = "Extract cadence-grouped requirement statements from document text"
)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "REQSCAN_DB", default_value = "data/reqscan.sqlite")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extraction pipeline over one or more text documents
    Ingest {
        /// Plain-text documents (PDF text extracted upstream)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Classifier matching granularity
        #[arg(long, value_enum, default_value_t = Granularity::Sentence)]
        granularity: Granularity,
        /// Override the obligation token set (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tokens: Option<Vec<String>>,
        /// Match tokens case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Edit annotation fields on a stored requirement
    Update {
        /// Row id of the record to edit
        #[arg(long, conflicts_with_all = ["family", "cadence", "description"])]
        id: Option<i64>,
        /// Family of the record to edit (with --cadence and --description)
        #[arg(long, requires_all = ["cadence", "description"])]
        family: Option<String>,
        #[arg(long)]
        cadence: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        module: Option<String>,
    },
    /// Store totals
    Stats,
    /// Cadence labels and per-cadence record counts as JSON
    Chart,
    /// Review table: one row per requirement, one column per cadence
    Pivot {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Write the positional export matrix as CSV
    Export {
        /// Output path (default: requirements_<timestamp>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Family used for synthesized requirement IDs
        #[arg(long)]
        family: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let conn = db::connect(&cli.db)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Ingest {
            files,
            granularity,
            tokens,
            case_sensitive,
        } => {
            let mut policy = Policy::for_granularity(granularity);
            if let Some(tokens) = tokens {
                policy.tokens = tokens;
            }
            policy.case_sensitive = case_sensitive;
            ingest(&conn, &files, &policy)
        }
        Commands::Update {
            id,
            family,
            cadence,
            description,
            priority,
            owner,
            status,
            module,
        } => {
            let key = match (id, family, cadence, description) {
                (Some(id), _, _, _) => db::UpdateKey::Id(id),
                (None, Some(family), Some(cadence), Some(description)) => db::UpdateKey::Triple {
                    family,
                    cadence,
                    description,
                },
                _ => bail!("update needs --id or all of --family/--cadence/--description"),
            };
            let update = db::AnnotationUpdate {
                priority,
                owner,
                status,
                module,
            };
            if update.is_empty() {
                bail!("nothing to update: pass --priority/--owner/--status/--module");
            }
            let changed = db::update_annotations(&conn, &key, &update)?;
            println!("Updated {} record(s).", changed);
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Records:   {}", s.records);
            println!("Cadences:  {}", s.cadences);
            println!("Families:  {}", s.families);
            println!("Info-only: {}", s.info_only);
            Ok(())
        }
        Commands::Chart => {
            let counts = db::cadence_counts(&conn)?;
            let labels: Vec<&str> = counts.iter().map(|(c, _)| c.as_str()).collect();
            let values: Vec<i64> = counts.iter().map(|(_, n)| *n).collect();
            println!(
                "{}",
                serde_json::json!({ "labels": labels, "counts": values })
            );
            Ok(())
        }
        Commands::Pivot { limit } => {
            let records = db::fetch_all(&conn)?;
            if records.is_empty() {
                println!("No requirements stored. Run 'ingest' first.");
                return Ok(());
            }
            print_pivot(&views::build_pivot(&records), limit);
            Ok(())
        }
        Commands::Export { out, family } => {
            let records = db::fetch_all(&conn)?;
            let family = family.unwrap_or_else(|| views::export_family(&records));
            let matrix = views::build_export_matrix(&records, &family);
            let path = out.unwrap_or_else(export::default_export_path);
            export::write_matrix(&path, &matrix)?;
            println!(
                "Wrote {} data rows to {}",
                matrix.len().saturating_sub(1),
                path.display()
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

enum DocOutcome {
    Ingested {
        extracted: usize,
        outcome: db::InsertOutcome,
    },
    Failed(anyhow::Error),
}

/// Ingest each document independently: parse in parallel, then commit one
/// transaction per document so a failing file never blocks or corrupts its
/// siblings. Prints a per-file report and fails if any document failed.
fn ingest(conn: &rusqlite::Connection, files: &[PathBuf], policy: &Policy) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let classifier = Classifier::new(policy)?;
    let extractor = extract::PlainTextExtractor;

    // Parse phase: pure per-file work.
    let parsed: Vec<(PathBuf, Result<parser::ExtractedDoc>)> = files
        .par_iter()
        .map(|path| {
            let doc = extractor
                .extract_text(path)
                .map(|text| parser::process_document(&text, &classifier));
            (path.clone(), doc)
        })
        .collect();

    // Insert phase: serial, one batch per document.
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut report: Vec<(PathBuf, DocOutcome)> = Vec::with_capacity(parsed.len());
    for (path, doc) in parsed {
        let outcome = match doc {
            Ok(doc) => match db::insert_records(conn, &doc.records) {
                Ok(outcome) => DocOutcome::Ingested {
                    extracted: doc.records.len(),
                    outcome,
                },
                Err(e) => DocOutcome::Failed(e),
            },
            Err(e) => DocOutcome::Failed(e),
        };
        report.push((path, outcome));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut failed = 0;
    for (path, outcome) in &report {
        match outcome {
            DocOutcome::Ingested { extracted, outcome } => {
                println!(
                    "ok     {}: {} extracted, {} inserted, {} duplicate",
                    path.display(),
                    extracted,
                    outcome.inserted,
                    outcome.skipped
                );
            }
            DocOutcome::Failed(e) => {
                failed += 1;
                tracing::warn!("{} failed: {:#}", path.display(), e);
                println!("FAILED {}: {:#}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} documents failed", failed, report.len());
    }
    Ok(())
}

fn print_pivot(view: &views::PivotView, limit: usize) {
    const CADENCE_WIDTH: usize = 36;

    let mut header = format!("{:>4} | ", "#");
    for cadence in &view.cadences {
        header.push_str(&format!("{:<width$} | ", cadence, width = CADENCE_WIDTH));
    }
    header.push_str(&format!(
        "{:<8} | {:<10} | {:<10} | {:<10} | {}",
        "Pri", "Owner", "Status", "Module", "Dup"
    ));
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));

    for row in view.rows.iter().take(limit) {
        let mut line = format!("{:>4} | ", row.seq);
        for cell in &row.cells {
            line.push_str(&format!(
                "{:<width$} | ",
                truncate(cell, CADENCE_WIDTH),
                width = CADENCE_WIDTH
            ));
        }
        line.push_str(&format!(
            "{:<8} | {:<10} | {:<10} | {:<10} | {}",
            truncate(&row.priority, 8),
            truncate(&row.owner, 10),
            truncate(&row.status, 10),
            truncate(&row.module, 10),
            if row.duplicate { "dup" } else { "" }
        ));
        println!("{}", line);
    }

    if view.rows.len() > limit {
        println!("... {} more rows (raise -n to see them)", view.rows.len() - limit);
    }
    println!("\n{} requirements", view.rows.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──
