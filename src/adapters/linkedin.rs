use crate::adapters::universal::{UniversalAdapter, GENERIC_SELECTORS};
use crate::adapters::{attribute_in_ancestry, has_class_in_ancestry, TextFieldAdapter};
use crate::config::{PenConfig, ValidityRules};
use crate::context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
use crate::dom::{Document, NodeId};

const LINKEDIN_SELECTORS: &[&str] = &[
    ".share-creation-state__text-editor [contenteditable=\"true\"]",
    "div.ql-editor[contenteditable=\"true\"]",
    "div[aria-label*=\"Text editor for creating content\" i]",
    ".comments-comment-box__form [contenteditable=\"true\"]",
    ".comments-comment-texteditor [contenteditable=\"true\"]",
    ".msg-form__contenteditable",
    ".article-editor [contenteditable=\"true\"]",
];

/// LinkedIn post composer, comments, messaging and articles
#[derive(Debug, Clone, Default)]
pub struct LinkedInAdapter {
    base: UniversalAdapter,
}

impl LinkedInAdapter {
    pub fn new(config: &PenConfig) -> Self {
        Self { base: UniversalAdapter::new(config) }
    }
}

fn class_contains(doc: &Document, element: NodeId, needle: &str) -> bool {
    has_class_in_ancestry(doc, element, |c| c.contains(needle))
}

impl TextFieldAdapter for LinkedInAdapter {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn rules(&self) -> &ValidityRules {
        self.base.rules()
    }

    fn selectors(&self) -> Vec<&'static str> {
        LINKEDIN_SELECTORS.iter().chain(GENERIC_SELECTORS).copied().collect()
    }

    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext {
        let mut context = self.base.classify_field(doc, element);
        context.platform = Platform::LinkedIn;

        if class_contains(doc, element, "comments-comment") {
            context = context
                .with_kind(FieldType::Comment, Formality::Professional)
                .with_purpose(Purpose::Reply);
        } else if class_contains(doc, element, "msg-form") {
            context = context
                .with_kind(FieldType::Message, Formality::Professional)
                .with_purpose(Purpose::Reply);
        } else if class_contains(doc, element, "article-editor") {
            context = context
                .with_kind(FieldType::Article, Formality::Formal)
                .with_purpose(Purpose::Compose);
        } else if class_contains(doc, element, "share-") || attribute_in_ancestry(doc, element, "aria-label", "creating content") {
            context = context
                .with_kind(FieldType::SocialPost, Formality::Professional)
                .with_purpose(Purpose::Compose);
        } else if context.formality == Formality::Neutral {
            // Everything on LinkedIn reads as professional by default
            context.formality = Formality::Professional;
        }

        context
    }
}
