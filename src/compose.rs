//! Document composition from raw export records.
//!
//! Maps each raw ticket or page into a canonical [`Document`]: the
//! record's semantic fields are flattened into one embeddable text block,
//! normalized, and paired with its source tag, display metadata, and URL.
//! Records whose normalized text ends up empty are dropped — an empty
//! vector has no meaningful direction and would corrupt similarity
//! ranking downstream.

use crate::models::{Document, Metadata, PageMetadata, RawPage, RawTicket, Source, TicketMetadata};
use crate::normalize::normalize_text;

/// Compose a ticket into a retrievable document.
///
/// Missing optional fields render as empty strings. `source_id` is the
/// ticket key, falling back to the internal id when no key is present.
/// Returns `None` if the normalized text is empty.
pub fn compose_ticket(ticket: &RawTicket) -> Option<Document> {
    let summary = ticket.summary.clone().unwrap_or_default();
    let description = ticket.description.clone().unwrap_or_default();
    let status = ticket.status.clone().unwrap_or_default();
    let priority = ticket.priority.clone().unwrap_or_default();
    let issue_type = ticket.issue_type.clone().unwrap_or_default();

    let full_text = format!(
        "{summary}\n\n{description}\n\nStatus: {status}\nPriority: {priority}\nType: {issue_type}"
    );
    let text = normalize_text(&full_text);
    if text.is_empty() {
        return None;
    }

    let source_id = ticket
        .key
        .clone()
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| ticket.id.clone());

    Some(Document {
        text,
        source: Source::Jira,
        source_id,
        title: summary,
        url: ticket.url.clone().unwrap_or_default(),
        metadata: Metadata::Ticket(TicketMetadata {
            status,
            priority,
            issue_type,
            assignee: ticket.assignee.clone().unwrap_or_default(),
            reporter: ticket.reporter.clone().unwrap_or_default(),
            created: ticket.created.clone().unwrap_or_default(),
            updated: ticket.updated.clone().unwrap_or_default(),
            labels: ticket.labels.clone(),
            components: ticket.components.clone(),
        }),
    })
}

/// Compose a wiki page into a retrievable document.
///
/// Returns `None` if the normalized text is empty.
pub fn compose_page(page: &RawPage) -> Option<Document> {
    let title = page.title.clone().unwrap_or_default();
    let content = page.content.clone().unwrap_or_default();
    let space_name = page.space_name.clone().unwrap_or_default();

    let full_text = format!("{title}\n\nSpace: {space_name}\n\n{content}");
    let text = normalize_text(&full_text);
    if text.is_empty() {
        return None;
    }

    Some(Document {
        text,
        source: Source::Confluence,
        source_id: page.id.clone(),
        title,
        url: page.url.clone().unwrap_or_default(),
        metadata: Metadata::Page(PageMetadata {
            space_key: page.space_key.clone().unwrap_or_default(),
            space_name,
            version: page.version,
            created: page.created.clone().unwrap_or_default(),
        }),
    })
}
