//! Data types for documents, blocks and store statistics.

use serde::{Deserialize, Serialize};

/// Kind of a block within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Paragraph,
    Table,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Table => "table",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paragraph" => Some(Self::Paragraph),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retrievable unit of a document. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: i64,
    pub doc_id: i64,
    /// Ordinal position within the document, increasing in source order.
    pub index: i64,
    pub kind: BlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_html: Option<String>,
}

impl Block {
    pub fn is_table(&self) -> bool {
        self.kind == BlockKind::Table
    }

    /// Plain text, or empty.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Text followed by table markup, for substring matching.
    pub fn combined_text(&self) -> String {
        match (&self.text, &self.table_html) {
            (Some(t), Some(h)) => format!("{} {}", t, h),
            (Some(t), None) => t.clone(),
            (None, Some(h)) => h.clone(),
            (None, None) => String::new(),
        }
    }
}

/// A document row: identifier plus the filename used to label evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub created_at: i64,
}

/// Searchable block columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockField {
    Text,
    TableHtml,
}

impl BlockField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TableHtml => "table_html",
        }
    }
}

/// A block to insert. Written by the ingestion process and by tests.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub index: i64,
    pub kind: BlockKind,
    pub text: Option<String>,
    pub table_html: Option<String>,
}

impl NewBlock {
    pub fn paragraph(index: i64, text: impl Into<String>) -> Self {
        Self {
            index,
            kind: BlockKind::Paragraph,
            text: Some(text.into()),
            table_html: None,
        }
    }

    pub fn table(index: i64, table_html: impl Into<String>) -> Self {
        Self {
            index,
            kind: BlockKind::Table,
            text: None,
            table_html: Some(table_html.into()),
        }
    }
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub total_blocks: i64,
    pub table_blocks: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
