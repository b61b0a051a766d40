//! Evidence, question classification and extraction result types.

use serde::{Deserialize, Serialize};

/// Externally visible citation unit, built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub filename: String,
    #[serde(flatten)]
    pub body: EvidenceBody,
}

/// Paragraph text or table markup, tagged by `block_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block_type")]
pub enum EvidenceBody {
    #[serde(rename = "p")]
    Paragraph { text: String },
    #[serde(rename = "table_html")]
    Table { table_html: String },
}

impl Evidence {
    pub fn paragraph(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            body: EvidenceBody::Paragraph { text: text.into() },
        }
    }

    pub fn table(filename: impl Into<String>, table_html: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            body: EvidenceBody::Table {
                table_html: table_html.into(),
            },
        }
    }

    pub fn paragraph_text(&self) -> Option<&str> {
        match &self.body {
            EvidenceBody::Paragraph { text } => Some(text),
            EvidenceBody::Table { .. } => None,
        }
    }

    pub fn table_html(&self) -> Option<&str> {
        match &self.body {
            EvidenceBody::Table { table_html } => Some(table_html),
            EvidenceBody::Paragraph { .. } => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.body, EvidenceBody::Table { .. })
    }
}

/// Expected shape of the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// "How many days" — a day/hour count.
    Days,
    /// Enumerate every entry of a table.
    List,
    /// Standards, conditions, targets, attachments, procedures.
    Criteria,
    Unknown,
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days => write!(f, "days"),
            Self::List => write!(f, "list"),
            Self::Criteria => write!(f, "criteria"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Family-relation and leave-event vocabulary detected in a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Spouse,
    Parent,
    Child,
    Sibling,
    Grandparent,
    Family,
    Marriage,
    Bereavement,
    Childbirth,
    ReserveDuty,
    SickLeave,
    OfficialLeave,
}

impl EventTag {
    /// Normalized keyword looked up in table rows.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Spouse => "배우자",
            Self::Parent => "부모",
            Self::Child => "자녀",
            Self::Sibling => "형제",
            Self::Grandparent => "조부모",
            Self::Family => "가족",
            Self::Marriage => "결혼",
            Self::Bereavement => "사망",
            Self::Childbirth => "출산",
            Self::ReserveDuty => "예비군",
            Self::SickLeave => "병가",
            Self::OfficialLeave => "공가",
        }
    }
}

/// What the synthesizer needs to know about the question.
#[derive(Debug, Clone)]
pub struct ExtractQuery {
    pub question: String,
    pub kind: QuestionKind,
    /// Query tokens used for row matching.
    pub tokens: Vec<String>,
    pub event_tags: Vec<EventTag>,
}

/// Which piece of evidence produced the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ExtractTrace {
    /// A single table row.
    TableRow {
        evidence_index: usize,
        row: Vec<String>,
        score: i64,
    },
    /// Every body row of a table.
    TableRows { evidence_index: usize, rows: usize },
    /// A sectioned free-text document.
    Sections { headings: Vec<String> },
}

/// The synthesized answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub ok: bool,
    pub kind: QuestionKind,
    /// Markdown answer text.
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ExtractTrace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_serializes_block_type() {
        let p = serde_json::to_value(Evidence::paragraph("a.docx", "본문")).unwrap();
        assert_eq!(p["block_type"], "p");
        assert_eq!(p["text"], "본문");
        assert_eq!(p["filename"], "a.docx");

        let t = serde_json::to_value(Evidence::table("a.docx", "<table></table>")).unwrap();
        assert_eq!(t["block_type"], "table_html");
        assert_eq!(t["table_html"], "<table></table>");
    }

    #[test]
    fn test_trace_tagged_by_source() {
        let trace = ExtractTrace::Sections {
            headings: vec!["시행일".into()],
        };
        let v = serde_json::to_value(&trace).unwrap();
        assert_eq!(v["source"], "sections");
    }
}
