//! Platform adapters
//!
//! Every adapter exposes the same text-field capability set. The
//! [`universal`] adapter works on any page; the specialized adapters put
//! site-specific selectors ahead of the universal ones, add exclusion rules
//! and refine the classification, delegating everything else to the shared
//! universal functions.

pub mod gmail;
pub mod google_docs;
pub mod linkedin;
pub mod notion;
pub mod universal;

pub use gmail::GmailAdapter;
pub use google_docs::GoogleDocsAdapter;
pub use linkedin::LinkedInAdapter;
pub use notion::NotionAdapter;
pub use universal::UniversalAdapter;

use crate::config::{PenConfig, ValidityRules};
use crate::context::{Platform, TextFieldContext};
use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Uniform text-field contract over heterogeneous page structures
pub trait TextFieldAdapter: Send + Sync {
    /// Platform this adapter serves
    fn platform(&self) -> Platform;

    /// Static identity tag of the platform
    fn platform_name(&self) -> &'static str {
        self.platform().as_str()
    }

    /// Validity thresholds applied during discovery
    fn rules(&self) -> &ValidityRules;

    /// Selectors tried in priority order
    fn selectors(&self) -> Vec<&'static str>;

    /// Platform-specific rule removing candidates that passed validity checks
    fn is_excluded(&self, _doc: &Document, _element: NodeId) -> bool {
        false
    }

    /// Whether a candidate element is a usable text field
    fn is_valid_text_field(&self, doc: &Document, element: NodeId) -> bool {
        universal::is_valid_text_field(doc, element, self.rules())
    }

    /// Find every valid text field within `scope`
    ///
    /// Fails only if one of the adapter's selectors is malformed.
    fn discover_fields(&self, doc: &Document, scope: NodeId) -> Result<Vec<NodeId>> {
        let candidates = universal::collect_candidates(doc, scope, &self.selectors())?;
        let fields: Vec<NodeId> = candidates
            .into_iter()
            .filter(|&el| self.is_valid_text_field(doc, el) && !self.is_excluded(doc, el))
            .collect();
        log::debug!("{} adapter discovered {} field(s)", self.platform_name(), fields.len());
        Ok(fields)
    }

    /// Infer the semantic purpose of a field
    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext;

    /// Current text of the field
    fn read_text(&self, doc: &Document, element: NodeId) -> String {
        universal::read_field_text(doc, element)
    }

    /// Replace the whole field content and notify listeners
    fn write_text(&self, doc: &mut Document, element: NodeId, text: &str) -> Result<()> {
        universal::write_field_text(doc, element, text)
    }

    /// Insert at the caret, replacing any active selection, and notify listeners
    fn insert_at_cursor(&self, doc: &mut Document, element: NodeId, text: &str) -> Result<()> {
        universal::insert_field_text(doc, element, text)
    }

    /// Replace the active selection; returns `false` without changes when nothing is selected
    fn replace_selection(&self, doc: &mut Document, element: NodeId, text: &str) -> Result<bool> {
        universal::replace_field_selection(doc, element, text)
    }
}

/// Constructor registered for an adapter name
pub type AdapterFactory = fn(&PenConfig) -> Box<dyn TextFieldAdapter>;

/// Factory of the adapter compiled into the crate for a platform
pub fn builtin_factory(platform: Platform) -> AdapterFactory {
    match platform {
        Platform::Universal => |config: &PenConfig| -> Box<dyn TextFieldAdapter> { Box::new(UniversalAdapter::new(config)) },
        Platform::Gmail => |config: &PenConfig| -> Box<dyn TextFieldAdapter> { Box::new(GmailAdapter::new(config)) },
        Platform::LinkedIn => |config: &PenConfig| -> Box<dyn TextFieldAdapter> { Box::new(LinkedInAdapter::new(config)) },
        Platform::Notion => |config: &PenConfig| -> Box<dyn TextFieldAdapter> { Box::new(NotionAdapter::new(config)) },
        Platform::GoogleDocs => |config: &PenConfig| -> Box<dyn TextFieldAdapter> { Box::new(GoogleDocsAdapter::new(config)) },
    }
}

/// Whether `element` or one of its ancestors has a class token satisfying `pred`
pub(crate) fn has_class_in_ancestry(doc: &Document, element: NodeId, pred: impl Fn(&str) -> bool) -> bool {
    std::iter::once(element)
        .chain(doc.ancestors(element))
        .any(|node| doc.class_list(node).into_iter().any(&pred))
}

/// Whether `element` or one of its ancestors has an attribute whose lowercased value contains `needle`
pub(crate) fn attribute_in_ancestry(doc: &Document, element: NodeId, name: &str, needle: &str) -> bool {
    std::iter::once(element).chain(doc.ancestors(element)).any(|node| {
        doc.attribute(node, name)
            .is_some_and(|value| value.to_lowercase().contains(needle))
    })
}

/// Lowercased attribute value, empty when absent
pub(crate) fn lower_attr(doc: &Document, element: NodeId, name: &str) -> String {
    doc.attribute(element, name).unwrap_or_default().to_lowercase()
}
