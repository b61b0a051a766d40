//! Database schema SQL.

/// Core tables: documents and their ordered blocks.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS blocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    block_index INTEGER NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('paragraph', 'table')),
    text TEXT,
    table_html TEXT,
    UNIQUE (doc_id, block_index)
);

CREATE INDEX IF NOT EXISTS idx_blocks_doc_index ON blocks(doc_id, block_index);
"#;

/// FTS5 virtual table over block text and table markup.
///
/// The trigram tokenizer gives substring matching, which Korean text needs:
/// particles attach directly to nouns, so whitespace tokens rarely match.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS blocks_fts USING fts5(
    text, table_html,
    content='blocks', content_rowid='id',
    tokenize='trigram'
);
"#;

/// Triggers to keep the FTS index in sync with the blocks table.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS blocks_ai AFTER INSERT ON blocks BEGIN
    INSERT INTO blocks_fts(rowid, text, table_html)
    VALUES (new.id, COALESCE(new.text, ''), COALESCE(new.table_html, ''));
END;

CREATE TRIGGER IF NOT EXISTS blocks_ad AFTER DELETE ON blocks BEGIN
    INSERT INTO blocks_fts(blocks_fts, rowid, text, table_html)
    VALUES ('delete', old.id, COALESCE(old.text, ''), COALESCE(old.table_html, ''));
END;

CREATE TRIGGER IF NOT EXISTS blocks_au AFTER UPDATE ON blocks BEGIN
    INSERT INTO blocks_fts(blocks_fts, rowid, text, table_html)
    VALUES ('delete', old.id, COALESCE(old.text, ''), COALESCE(old.table_html, ''));
    INSERT INTO blocks_fts(rowid, text, table_html)
    VALUES (new.id, COALESCE(new.text, ''), COALESCE(new.table_html, ''));
END;
"#;
