use crate::adapters::universal::{UniversalAdapter, GENERIC_SELECTORS};
use crate::adapters::{attribute_in_ancestry, has_class_in_ancestry, lower_attr, TextFieldAdapter};
use crate::config::{PenConfig, ValidityRules};
use crate::context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
use crate::dom::{Document, NodeId};

const GMAIL_SELECTORS: &[&str] = &[
    "div[role=\"textbox\"][aria-label*=\"Message Body\" i]",
    "div[contenteditable=\"true\"][g_editable=\"true\"]",
    "div.editable[contenteditable=\"true\"]",
    "input[name=\"subjectbox\"]",
    "input[aria-label*=\"Subject\" i]",
];

/// Gmail compose, reply and subject fields
#[derive(Debug, Clone, Default)]
pub struct GmailAdapter {
    base: UniversalAdapter,
}

impl GmailAdapter {
    pub fn new(config: &PenConfig) -> Self {
        Self { base: UniversalAdapter::new(config) }
    }

    fn is_subject(doc: &Document, element: NodeId) -> bool {
        lower_attr(doc, element, "name") == "subjectbox" || lower_attr(doc, element, "aria-label").contains("subject")
    }

    fn is_body(doc: &Document, element: NodeId) -> bool {
        doc.attribute(element, "role") == Some("textbox")
            || doc.attribute(element, "g_editable") == Some("true")
            || lower_attr(doc, element, "aria-label").contains("message body")
    }

    fn in_reply(doc: &Document, element: NodeId) -> bool {
        attribute_in_ancestry(doc, element, "aria-label", "reply")
            || has_class_in_ancestry(doc, element, |c| c.to_ascii_lowercase().contains("reply"))
    }
}

impl TextFieldAdapter for GmailAdapter {
    fn platform(&self) -> Platform {
        Platform::Gmail
    }

    fn rules(&self) -> &ValidityRules {
        self.base.rules()
    }

    fn selectors(&self) -> Vec<&'static str> {
        GMAIL_SELECTORS.iter().chain(GENERIC_SELECTORS).copied().collect()
    }

    /// Quoted history and signatures are not part of the message being written
    fn is_excluded(&self, doc: &Document, element: NodeId) -> bool {
        has_class_in_ancestry(doc, element, |c| {
            let c = c.to_ascii_lowercase();
            c.contains("gmail_quote") || c.contains("gmail_signature") || c == "quote" || c == "signature"
        })
    }

    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext {
        let mut context = self.base.classify_field(doc, element);
        context.platform = Platform::Gmail;

        if Self::is_subject(doc, element) {
            context = context.with_kind(FieldType::EmailSubject, Formality::Professional);
        } else if Self::is_body(doc, element) {
            context = context.with_kind(FieldType::EmailBody, Formality::Professional);
        } else {
            return context;
        }

        context.purpose = if Self::in_reply(doc, element) { Purpose::Reply } else { Purpose::Compose };
        context
    }
}
