use crate::adapters::universal::{self, UniversalAdapter, GENERIC_SELECTORS};
use crate::adapters::{has_class_in_ancestry, TextFieldAdapter};
use crate::config::{PenConfig, ValidityRules};
use crate::context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Class of the element holding a rendered page tile of the document
pub const CANVAS_TILE_CLASS: &str = "kix-canvas-tile-content";

const GOOGLE_DOCS_SELECTORS: &[&str] = &[
    ".kix-canvas-tile-content",
    ".docos-input-textarea",
    ".docos-input-contenteditable[contenteditable=\"true\"]",
    ".docos-anchoredreplyview-input [contenteditable=\"true\"]",
    "[contenteditable=\"true\"][aria-label*=\"suggest\" i]",
];

/// Google Docs document canvas, comments and suggestions
#[derive(Debug, Clone, Default)]
pub struct GoogleDocsAdapter {
    base: UniversalAdapter,
}

impl GoogleDocsAdapter {
    pub fn new(config: &PenConfig) -> Self {
        Self { base: UniversalAdapter::new(config) }
    }

    /// Whether the element is the document canvas tile itself
    pub fn is_canvas_tile(doc: &Document, element: NodeId) -> bool {
        doc.has_class(element, CANVAS_TILE_CLASS)
    }

    fn is_suggestion(doc: &Document, element: NodeId) -> bool {
        has_class_in_ancestry(doc, element, |c| c.contains("suggest"))
            || doc
                .attribute(element, "aria-label")
                .is_some_and(|label| label.to_lowercase().contains("suggest"))
    }
}

impl TextFieldAdapter for GoogleDocsAdapter {
    fn platform(&self) -> Platform {
        Platform::GoogleDocs
    }

    fn rules(&self) -> &ValidityRules {
        self.base.rules()
    }

    fn selectors(&self) -> Vec<&'static str> {
        GOOGLE_DOCS_SELECTORS.iter().chain(GENERIC_SELECTORS).copied().collect()
    }

    /// The editor's own `kix-` chrome is excluded, except the canvas tile
    fn is_excluded(&self, doc: &Document, element: NodeId) -> bool {
        if Self::is_canvas_tile(doc, element) {
            return false;
        }
        has_class_in_ancestry(doc, element, |c| c.starts_with("kix-"))
    }

    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext {
        let mut context = self.base.classify_field(doc, element);
        context.platform = Platform::GoogleDocs;

        if Self::is_canvas_tile(doc, element) {
            context
                .with_kind(FieldType::Document, Formality::Formal)
                .with_purpose(Purpose::Edit)
        } else if Self::is_suggestion(doc, element) {
            context
                .with_kind(FieldType::Suggestion, Formality::Professional)
                .with_purpose(Purpose::Edit)
        } else if has_class_in_ancestry(doc, element, |c| c.starts_with("docos")) {
            context
                .with_kind(FieldType::Comment, Formality::Professional)
                .with_purpose(Purpose::Reply)
        } else {
            context
        }
    }

    /// Rewriting the canvas tile goes through the caret path: its content is
    /// selected and replaced by an insertion. This is best effort against the
    /// host's own rendering model.
    fn write_text(&self, doc: &mut Document, element: NodeId, text: &str) -> Result<()> {
        if Self::is_canvas_tile(doc, element) {
            log::debug!("Routing canvas tile write through cursor insertion");
            doc.select_node_contents(element);
            return universal::insert_field_text(doc, element, text);
        }
        universal::write_field_text(doc, element, text)
    }
}
