//! SQLite-backed block store with FTS5 trigram search.
//!
//! Queries are short and local, so the `BlockStore` futures resolve
//! immediately with the result of the synchronous call.

use std::future::{ready, Future};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::block_store::{escape_like, BlockStore};
use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use policyqa_core::{Error, Result};

/// Trigram phrases shorter than this never match anything.
const TRIGRAM_MIN_CHARS: usize = 3;

/// SQLite store holding documents and their blocks.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/policyqa.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("policyqa.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "SqliteStore initialized: {} documents, {} blocks, path={}",
            store.count_documents()?,
            store.count_blocks()?,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Writes (ingestion side)
    // ---------------------------------------------------------------

    /// Insert a document. Returns the new document ID.
    pub fn add_document(&self, filename: &str) -> Result<i64> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached("INSERT INTO documents (filename, created_at) VALUES (?1, ?2)")
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![filename, now])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Insert a block into a document. Returns the new block ID.
    pub fn add_block(&self, doc_id: i64, block: &NewBlock) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO blocks (doc_id, block_index, kind, text, table_html) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                doc_id,
                block.index,
                block.kind.as_str(),
                block.text,
                block.table_html,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Get a document by ID.
    pub fn get_document(&self, doc_id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM documents WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![doc_id], |row| Ok(Self::row_to_document(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Count total documents.
    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Count total blocks.
    pub fn count_blocks(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Full-text search using FTS5 ranking over text and table markup.
    pub fn search_blocks(&self, query: &str, limit: usize) -> Result<Vec<Block>> {
        let fts_query = Self::fts_match_expr(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let sql = "SELECT b.* \
                   FROM blocks_fts \
                   JOIN blocks b ON b.id = blocks_fts.rowid \
                   WHERE blocks_fts MATCH ?1 \
                   ORDER BY blocks_fts.rank \
                   LIMIT ?2";
        let mut stmt = conn.prepare_cached(sql).map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![fts_query, limit as i64], |row| Ok(Self::row_to_block(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        let blocks: Vec<Block> = rows.filter_map(|r| r.ok()).collect();
        debug!("FTS `{}` -> {} blocks", fts_query, blocks.len());
        Ok(blocks)
    }

    /// Build an FTS5 MATCH expression: each token quoted, joined with OR.
    fn fts_match_expr(query: &str) -> String {
        let mut tokens: Vec<String> = Vec::new();
        for raw in query.split_whitespace() {
            let token = raw.replace('"', "");
            if token.chars().count() < TRIGRAM_MIN_CHARS {
                continue;
            }
            let quoted = format!("\"{}\"", token);
            if !tokens.contains(&quoted) {
                tokens.push(quoted);
            }
        }
        tokens.join(" OR ")
    }

    /// LIKE substring search over one column. `pattern` is already escaped.
    pub fn search_pattern(&self, pattern: &str, field: BlockField, limit: usize) -> Result<Vec<Block>> {
        let sql = format!(
            r"SELECT * FROM blocks WHERE {} LIKE '%' || ?1 || '%' ESCAPE '\' ORDER BY doc_id, block_index LIMIT ?2",
            field.column()
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql).map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![pattern, limit as i64], |row| Ok(Self::row_to_block(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Blocks of one document within an inclusive index range.
    pub fn get_blocks_in_range(&self, doc_id: i64, min_index: i64, max_index: i64) -> Result<Vec<Block>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM blocks WHERE doc_id = ?1 \
                 AND block_index BETWEEN ?2 AND ?3 ORDER BY block_index",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![doc_id, min_index, max_index], |row| {
                Ok(Self::row_to_block(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Blocks of one document where any of `fields` contains `substring` literally.
    pub fn get_blocks_containing(
        &self,
        doc_id: i64,
        substring: &str,
        fields: &[BlockField],
        limit: usize,
    ) -> Result<Vec<Block>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let predicate = fields
            .iter()
            .map(|f| format!(r"{} LIKE '%' || ?2 || '%' ESCAPE '\'", f.column()))
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT * FROM blocks WHERE doc_id = ?1 AND ({}) ORDER BY block_index LIMIT ?3",
            predicate
        );
        let pattern = escape_like(substring);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![doc_id, pattern, limit as i64], |row| {
                Ok(Self::row_to_block(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let total_documents = self.count_documents()?;
        let total_blocks = self.count_blocks()?;

        let conn = self.conn.lock();
        let table_blocks: i64 = conn
            .query_row("SELECT COUNT(*) FROM blocks WHERE kind = 'table'", [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            total_documents,
            total_blocks,
            table_blocks,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_document(row: &rusqlite::Row<'_>) -> Document {
        Document {
            id: row.get("id").unwrap_or(0),
            filename: row.get("filename").unwrap_or_default(),
            created_at: row.get("created_at").unwrap_or(0),
        }
    }

    fn row_to_block(row: &rusqlite::Row<'_>) -> Block {
        let kind: String = row.get("kind").unwrap_or_default();
        Block {
            id: row.get("id").unwrap_or(0),
            doc_id: row.get("doc_id").unwrap_or(0),
            index: row.get("block_index").unwrap_or(0),
            kind: BlockKind::parse(&kind).unwrap_or(BlockKind::Paragraph),
            text: row.get("text").ok().flatten(),
            table_html: row.get("table_html").ok().flatten(),
        }
    }
}

impl BlockStore for SqliteStore {
    fn full_text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send {
        ready(self.search_blocks(query, limit))
    }

    fn pattern_search(
        &self,
        pattern: &str,
        field: BlockField,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send {
        ready(self.search_pattern(pattern, field, limit))
    }

    fn blocks_in_range(
        &self,
        doc_id: i64,
        min_index: i64,
        max_index: i64,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send {
        ready(self.get_blocks_in_range(doc_id, min_index, max_index))
    }

    fn blocks_matching(
        &self,
        doc_id: i64,
        substring: &str,
        fields: &[BlockField],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Block>>> + Send {
        ready(self.get_blocks_containing(doc_id, substring, fields, limit))
    }

    fn document_by_id(&self, id: i64) -> impl Future<Output = Result<Option<Document>>> + Send {
        ready(self.get_document(id))
    }
}
