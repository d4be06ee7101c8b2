use crate::adapters::universal::{UniversalAdapter, GENERIC_SELECTORS};
use crate::adapters::{attribute_in_ancestry, has_class_in_ancestry, lower_attr, TextFieldAdapter};
use crate::config::{PenConfig, ValidityRules};
use crate::context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
use crate::dom::{Document, NodeId};

const NOTION_SELECTORS: &[&str] = &[
    ".notion-page-block h1[contenteditable=\"true\"]",
    ".notion-title [contenteditable=\"true\"]",
    "[data-content-editable-leaf=\"true\"]",
    ".notion-discussion-input [contenteditable=\"true\"]",
];

/// Notion page titles, blocks and comments
#[derive(Debug, Clone, Default)]
pub struct NotionAdapter {
    base: UniversalAdapter,
}

impl NotionAdapter {
    pub fn new(config: &PenConfig) -> Self {
        Self { base: UniversalAdapter::new(config) }
    }

    fn is_title(doc: &Document, element: NodeId) -> bool {
        doc.tag_name(element) == Some("h1")
            || has_class_in_ancestry(doc, element, |c| c == "notion-title")
            || lower_attr(doc, element, "placeholder") == "untitled"
    }

    fn is_comment(doc: &Document, element: NodeId) -> bool {
        has_class_in_ancestry(doc, element, |c| c.contains("discussion") || c.contains("comment"))
            || lower_attr(doc, element, "aria-label").contains("comment")
    }
}

impl TextFieldAdapter for NotionAdapter {
    fn platform(&self) -> Platform {
        Platform::Notion
    }

    fn rules(&self) -> &ValidityRules {
        self.base.rules()
    }

    fn selectors(&self) -> Vec<&'static str> {
        NOTION_SELECTORS.iter().chain(GENERIC_SELECTORS).copied().collect()
    }

    /// Editable labels inside Notion's own buttons are UI, not content
    fn is_excluded(&self, doc: &Document, element: NodeId) -> bool {
        std::iter::once(element)
            .chain(doc.ancestors(element))
            .any(|node| doc.attribute(node, "role") == Some("button"))
            || attribute_in_ancestry(doc, element, "aria-label", "button")
    }

    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext {
        let mut context = self.base.classify_field(doc, element);
        context.platform = Platform::Notion;

        if Self::is_title(doc, element) {
            context.with_kind(FieldType::Title, Formality::Formal).with_purpose(Purpose::Edit)
        } else if Self::is_comment(doc, element) {
            context.with_kind(FieldType::Comment, Formality::Casual).with_purpose(Purpose::Reply)
        } else {
            context.field_type = FieldType::Document;
            if context.purpose == Purpose::Unknown {
                context.purpose = Purpose::Edit;
            }
            context
        }
    }
}
