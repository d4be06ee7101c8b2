//! Boundary to the on-device writing assistance provider
//!
//! The provider itself lives outside this crate. [`WritingCapability`] is the
//! request/response contract it is consumed through, and [`correct_field`]
//! connects its output to a discovered field.

use crate::adapters::TextFieldAdapter;
use crate::correction::{apply_to_plain_text, Correction};
use crate::dom::{Document, EventKind, NodeId};
use crate::error::{PenError, Result};
use crate::richtext::RichTextCorrector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Whether the provider can serve requests on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Available,
    /// Usable once its model has been downloaded
    AfterDownload,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    MoreFormal,
    #[default]
    AsIs,
    MoreCasual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Length {
    Shorter,
    #[default]
    AsIs,
    Longer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    #[default]
    AsIs,
    PlainText,
    Markdown,
}

/// Options of a rewrite request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewriteOptions {
    pub tone: Tone,
    pub format: Format,
    pub length: Length,
    /// Extra context about the text, e.g. the kind of field it comes from
    pub context: Option<String>,
}

impl RewriteOptions {
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Writing assistance provider
///
/// An unavailable provider reports [`PenError::CapabilityUnavailable`].
#[async_trait]
pub trait WritingCapability: Send + Sync {
    async fn availability(&self) -> Availability;

    /// Corrections against the character offsets of `text`
    async fn proofread(&self, text: &str) -> Result<Vec<Correction>>;

    async fn rewrite(&self, text: &str, options: &RewriteOptions) -> Result<String>;
}

/// What happened to a field after proofreading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCorrection {
    pub proposed: usize,
    pub applied: usize,
    /// Field text afterwards
    pub text: String,
}

async fn ensure_available(capability: &dyn WritingCapability) -> Result<()> {
    match capability.availability().await {
        Availability::Available => Ok(()),
        other => Err(PenError::CapabilityUnavailable(format!("writing assistance is {:?}", other))),
    }
}

/// Proofread a field and apply the corrections in place
///
/// Form controls are corrected through their value; rich-text fields through
/// the rich-text mapper so surrounding markup survives.
pub async fn correct_field(
    doc: &mut Document,
    adapter: &dyn TextFieldAdapter,
    element: NodeId,
    capability: &dyn WritingCapability,
) -> Result<FieldCorrection> {
    ensure_available(capability).await?;

    let text = adapter.read_text(doc, element);
    let corrections = capability.proofread(&text).await?;
    log::debug!("Provider proposed {} correction(s)", corrections.len());

    let applied = apply_corrections(doc, adapter, element, &corrections)?;
    Ok(FieldCorrection {
        proposed: corrections.len(),
        applied,
        text: adapter.read_text(doc, element),
    })
}

/// Apply already computed corrections to a field; returns how many were applied
pub fn apply_corrections(
    doc: &mut Document,
    adapter: &dyn TextFieldAdapter,
    element: NodeId,
    corrections: &[Correction],
) -> Result<usize> {
    let is_form_control = doc
        .element(element)
        .ok_or_else(|| PenError::NotAnElement(element.to_string()))?
        .is_form_control();

    if is_form_control {
        let (corrected, applied) = apply_to_plain_text(&adapter.read_text(doc, element), corrections);
        if applied > 0 {
            adapter.write_text(doc, element, &corrected)?;
        }
        return Ok(applied);
    }

    let applied = RichTextCorrector::new().apply_all_corrections(doc, element, corrections);
    if applied > 0 {
        doc.dispatch_event(element, EventKind::Input);
    }
    Ok(applied)
}

/// Rewrite the whole field text
pub async fn rewrite_field(
    doc: &mut Document,
    adapter: &dyn TextFieldAdapter,
    element: NodeId,
    capability: &dyn WritingCapability,
    options: &RewriteOptions,
) -> Result<String> {
    ensure_available(capability).await?;

    let text = adapter.read_text(doc, element);
    let rewritten = capability.rewrite(&text, options).await?;
    adapter.write_text(doc, element, &rewritten)?;
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::UniversalAdapter;
    use crate::dom::ElementNode;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Provider returning canned corrections for any text
    struct CannedProvider {
        availability: Availability,
        corrections: Vec<Correction>,
    }

    #[async_trait]
    impl WritingCapability for CannedProvider {
        async fn availability(&self) -> Availability {
            self.availability
        }

        async fn proofread(&self, _text: &str) -> Result<Vec<Correction>> {
            Ok(self.corrections.clone())
        }

        async fn rewrite(&self, text: &str, options: &RewriteOptions) -> Result<String> {
            match options.tone {
                Tone::MoreFormal => Ok(format!("Dear colleague, {}", text)),
                _ => Err(PenError::CapabilityFailed("unsupported tone".to_string())),
            }
        }
    }

    fn provider(corrections: Vec<Correction>) -> CannedProvider {
        CannedProvider { availability: Availability::Available, corrections }
    }

    fn page() -> Document {
        Document::from_root(
            "https://example.org",
            ElementNode::new("body")
                .with_child(
                    ElementNode::new("textarea")
                        .with_attribute("id", "plain")
                        .with_value("I seen him")
                        .sized(300.0, 80.0),
                )
                .with_child(
                    ElementNode::new("div")
                        .with_attribute("id", "rich")
                        .with_attribute("contenteditable", "true")
                        .sized(300.0, 80.0)
                        .with_text("I ")
                        .with_child(ElementNode::new("em").with_text("seen"))
                        .with_text(" him"),
                ),
        )
    }

    #[tokio::test]
    async fn test_correct_form_control() {
        let mut doc = page();
        let plain = doc.get_element_by_id("plain").unwrap();
        let capability = provider(vec![Correction::new(2, 6, "saw").with_original("seen")]);

        let outcome = correct_field(&mut doc, &UniversalAdapter::default(), plain, &capability)
            .await
            .unwrap();
        assert_eq!(outcome, FieldCorrection { proposed: 1, applied: 1, text: "I saw him".to_string() });
    }

    #[tokio::test]
    async fn test_correct_rich_text_keeps_markup_outside_span() {
        let mut doc = page();
        let rich = doc.get_element_by_id("rich").unwrap();
        let inputs = Rc::new(RefCell::new(0));
        let sink = inputs.clone();
        doc.add_event_listener(move |e| {
            if e.kind == EventKind::Input {
                *sink.borrow_mut() += 1;
            }
        });

        let capability = provider(vec![
            Correction::new(2, 6, "saw").with_original("seen"),
            Correction::new(7, 10, "her").with_original("hiz"),
        ]);
        let outcome = correct_field(&mut doc, &UniversalAdapter::default(), rich, &capability)
            .await
            .unwrap();

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.text, "I saw him");
        assert_eq!(*inputs.borrow(), 1);
        assert!(doc.children(rich).iter().any(|&c| doc.tag_name(c) == Some("em")));
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        let mut doc = page();
        let plain = doc.get_element_by_id("plain").unwrap();
        let capability = CannedProvider { availability: Availability::AfterDownload, corrections: vec![] };

        let err = correct_field(&mut doc, &UniversalAdapter::default(), plain, &capability)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(doc.value(plain), Some("I seen him"));
    }

    #[tokio::test]
    async fn test_rewrite_field() {
        let mut doc = page();
        let plain = doc.get_element_by_id("plain").unwrap();
        let capability = provider(vec![]);
        let adapter = UniversalAdapter::default();

        let formal = RewriteOptions::default().with_tone(Tone::MoreFormal);
        let text = rewrite_field(&mut doc, &adapter, plain, &capability, &formal).await.unwrap();
        assert_eq!(text, "Dear colleague, I seen him");
        assert_eq!(adapter.read_text(&doc, plain), text);

        let casual = RewriteOptions::default().with_tone(Tone::MoreCasual);
        let err = rewrite_field(&mut doc, &adapter, plain, &capability, &casual).await.unwrap_err();
        assert!(matches!(err, PenError::CapabilityFailed(_)));
    }

    #[test]
    fn test_rewrite_options_json() {
        let options: RewriteOptions = serde_json::from_str(r#"{"tone": "more-formal", "length": "shorter"}"#).unwrap();
        assert_eq!(options.tone, Tone::MoreFormal);
        assert_eq!(options.length, Length::Shorter);
        assert_eq!(options.format, Format::AsIs);
        assert_eq!(
            options,
            RewriteOptions::default().with_tone(Tone::MoreFormal).with_length(Length::Shorter)
        );
    }
}
