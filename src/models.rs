//! Core data models used throughout Atlas Recall.
//!
//! These types represent the raw export records, the canonical documents
//! derived from them, and the scored results that flow out of the
//! retrieval pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin system a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Jira,
    Confluence,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Jira => write!(f, "jira"),
            Source::Confluence => write!(f, "confluence"),
        }
    }
}

/// Raw issue-tracker ticket as written by the acquisition export.
///
/// Optional fields are routinely `null` in the export (unassigned tickets,
/// missing priority), so everything beyond `id` tolerates absence.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTicket {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Raw wiki page as written by the acquisition export.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub space_key: Option<String>,
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Display metadata carried alongside a ticket document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMetadata {
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    pub assignee: String,
    pub reporter: String,
    pub created: String,
    pub updated: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
}

/// Display metadata carried alongside a page document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub space_key: String,
    pub space_name: String,
    pub version: Option<i64>,
    pub created: String,
}

/// Source-specific metadata, pattern-matched by consumers rather than
/// probed as an open key/value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Metadata {
    Ticket(TicketMetadata),
    Page(PageMetadata),
}

/// Canonical retrievable unit derived from a ticket or page.
///
/// `text` is the cleaned, embeddable concatenation of the record's
/// semantic fields and is always non-empty for composed documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source: Source,
    pub source_id: String,
    pub title: String,
    pub url: String,
    pub metadata: Metadata,
}

/// A document returned from retrieval, annotated with its similarity
/// score. The score is attached at query time and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub similarity_score: f32,
}
