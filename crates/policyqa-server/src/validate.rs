//! Data directory validation: schema check, row counts and pipeline config.

use std::path::Path;

use policyqa_core::PipelineConfig;
use rusqlite::Connection;
use tracing::info;

/// Outcome of validating a data directory.
#[derive(Debug)]
pub struct ValidationReport {
    pub db_valid: bool,
    pub documents: i64,
    pub blocks: i64,
    pub table_blocks: i64,
    pub pipeline_overrides: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate that `data_dir` holds a usable block database.
pub fn validate(data_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        db_valid: false,
        documents: 0,
        blocks: 0,
        table_blocks: 0,
        pipeline_overrides: false,
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    let pipeline_file = data_dir.join("pipeline.json");
    match PipelineConfig::load(&pipeline_file) {
        Ok(config) => report.pipeline_overrides = config != PipelineConfig::default(),
        Err(e) => report.errors.push(e.to_string()),
    }

    let db_path = data_dir.join("db/policyqa.db");
    if !db_path.exists() {
        report
            .errors
            .push(format!("Database not found: {}", db_path.display()));
        return report;
    }

    let conn = match Connection::open_with_flags(&db_path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
    {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open database: {}", e));
            return report;
        }
    };

    for table in ["documents", "blocks", "blocks_fts"] {
        match table_exists(&conn, table) {
            Ok(true) => {}
            Ok(false) => report.errors.push(format!("Missing required table: {}", table)),
            Err(e) => report
                .errors
                .push(format!("Error checking table {}: {}", table, e)),
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    let required_columns: [(&str, &[&str]); 2] = [
        ("documents", &["id", "filename", "created_at"]),
        (
            "blocks",
            &["id", "doc_id", "block_index", "kind", "text", "table_html"],
        ),
    ];
    for (table, columns) in required_columns {
        let present = get_column_names(&conn, table);
        for col in columns {
            if !present.iter().any(|p| p == col) {
                report
                    .errors
                    .push(format!("{} table missing column: {}", table, col));
            }
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    report.db_valid = true;
    report.documents = count(&conn, "SELECT COUNT(*) FROM documents").unwrap_or(0);
    report.blocks = count(&conn, "SELECT COUNT(*) FROM blocks").unwrap_or(0);
    report.table_blocks =
        count(&conn, "SELECT COUNT(*) FROM blocks WHERE kind = 'table'").unwrap_or(0);

    if report.documents == 0 {
        report
            .warnings
            .push("No documents stored; every question will get the fallback answer".into());
    }
    let orphaned = count(
        &conn,
        "SELECT COUNT(*) FROM blocks WHERE kind = 'table' AND table_html IS NULL",
    )
    .unwrap_or(0);
    if orphaned > 0 {
        report
            .warnings
            .push(format!("{} table blocks have no markup", orphaned));
    }

    info!(
        "Validated {}: {} documents, {} blocks",
        db_path.display(),
        report.documents,
        report.blocks
    );
    report
}

pub fn print_report(report: &ValidationReport) {
    println!("=== PolicyQA Validation Report ===");
    println!();
    println!("Database valid:     {}", if report.db_valid { "YES" } else { "NO" });
    println!("Documents:          {}", report.documents);
    println!("Blocks:             {}", report.blocks);
    println!("Table blocks:       {}", report.table_blocks);
    println!(
        "Pipeline config:    {}",
        if report.pipeline_overrides { "overridden" } else { "defaults" }
    );

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.errors.is_empty() && report.db_valid {
        println!("Status: READY");
    } else {
        println!("Status: INVALID");
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn get_column_names(conn: &Connection, table: &str) -> Vec<String> {
    // Table names come from the fixed list above.
    let query = format!("PRAGMA table_info({})", table);
    let mut names = Vec::new();
    if let Ok(mut stmt) = conn.prepare(&query) {
        if let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) {
            names.extend(rows.flatten());
        }
    }
    names
}

fn count(conn: &Connection, sql: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(sql, [], |row| row.get(0))
}
