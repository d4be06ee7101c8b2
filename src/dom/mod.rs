//! In-process DOM model
//!
//! This module provides the document the adapters and the rich-text
//! corrector operate on. It includes:
//! - ElementNode / PageSnapshot: serializable page snapshots
//! - Document: arena-backed live DOM with selection and synthetic events
//! - Selector: the CSS selector subset used by adapter selector tables
//! - DomRange: range deletion and text insertion across node boundaries

pub mod document;
pub mod element;
#[cfg(feature = "live")]
pub mod live;
pub mod range;
pub mod selector;

pub use document::{BoundaryPoint, Document, DomEvent, ElementData, EventKind, NodeId, Selection};
pub use element::{hostname_of, BoundingBox, ElementNode, PageSnapshot};
pub use range::{insert_text, DomRange};
pub use selector::Selector;

use crate::error::{PenError, Result};

/// Load a page snapshot from its JSON form
pub fn parse_snapshot(json: &str) -> Result<PageSnapshot> {
    serde_json::from_str(json).map_err(|e| PenError::SnapshotFailed(format!("Failed to parse DOM JSON: {}", e)))
}

/// Build a live document from snapshot JSON
pub fn load_document(json: &str) -> Result<Document> {
    Ok(Document::from_snapshot(&parse_snapshot(json)?))
}
