//! Adapter usable on any page, and the shared field logic every adapter builds on

use crate::adapters::TextFieldAdapter;
use crate::config::{PenConfig, ValidityRules};
use crate::context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
use crate::dom::{BoundaryPoint, Document, DomRange, EventKind, NodeId, Selection, Selector};
use crate::error::{PenError, Result};
use indexmap::IndexSet;

/// Structural selectors for text surfaces on arbitrary pages
pub const GENERIC_SELECTORS: &[&str] = &[
    "input[type=\"text\" i]",
    "input[type=\"email\" i]",
    "input[type=\"search\" i]",
    "input:not([type])",
    "textarea",
    "[contenteditable=\"true\" i]",
    "[contenteditable=\"\"]",
];

/// Input types that hold free text
const TEXT_INPUT_TYPES: &[&str] = &["", "text", "email", "search", "url", "tel"];

/// Keyword groups setting field type and formality, first match wins
const TYPE_KEYWORDS: &[(&[&str], FieldType, Formality)] = &[
    (&["email", "e-mail"], FieldType::Email, Formality::Professional),
    (&["comment", "reply", "feedback"], FieldType::Comment, Formality::Casual),
    (&["message", "chat"], FieldType::Message, Formality::Casual),
    (&["post", "status", "share"], FieldType::SocialPost, Formality::Casual),
    (&["document", "note", "article"], FieldType::Document, Formality::Formal),
    (&["search", "query"], FieldType::Search, Formality::Neutral),
    (&["title", "subject", "heading"], FieldType::Title, Formality::Neutral),
];

/// Keyword groups setting the purpose, first match wins
const PURPOSE_KEYWORDS: &[(&[&str], Purpose)] = &[
    (&["compose", "write", "create"], Purpose::Compose),
    (&["edit", "modify", "update"], Purpose::Edit),
    (&["reply", "respond", "answer"], Purpose::Reply),
];

/// Adapter for pages without a specialized adapter
#[derive(Debug, Clone, Default)]
pub struct UniversalAdapter {
    rules: ValidityRules,
}

impl UniversalAdapter {
    pub fn new(config: &PenConfig) -> Self {
        Self { rules: config.validity }
    }
}

impl TextFieldAdapter for UniversalAdapter {
    fn platform(&self) -> Platform {
        Platform::Universal
    }

    fn rules(&self) -> &ValidityRules {
        &self.rules
    }

    fn selectors(&self) -> Vec<&'static str> {
        GENERIC_SELECTORS.to_vec()
    }

    fn classify_field(&self, doc: &Document, element: NodeId) -> TextFieldContext {
        classify_by_keywords(doc, element)
    }
}

/// Union of every selector's matches within `scope`, deduplicated, in selector order
pub fn collect_candidates(doc: &Document, scope: NodeId, selectors: &[&str]) -> Result<Vec<NodeId>> {
    let mut found = IndexSet::new();
    for source in selectors {
        let selector = Selector::parse(source)?;
        found.extend(doc.query_selector_all(scope, &selector));
    }
    Ok(found.into_iter().collect())
}

/// Whether an element is a usable text field
///
/// Rejects disabled, read-only, hidden, undersized and password fields.
pub fn is_valid_text_field(doc: &Document, element: NodeId, rules: &ValidityRules) -> bool {
    let Some(data) = doc.element(element) else {
        return false;
    };

    if data.attributes.contains_key("disabled") || data.attributes.contains_key("readonly") {
        return false;
    }
    if data.attributes.get("aria-disabled").is_some_and(|v| v == "true") {
        return false;
    }

    if data.tag_name == "input" {
        let input_type = data.attributes.get("type").map(|t| t.to_ascii_lowercase()).unwrap_or_default();
        if !TEXT_INPUT_TYPES.contains(&input_type.as_str()) {
            return false;
        }
    }

    if !doc.is_rendered(element) {
        return false;
    }

    data.bounding_box
        .is_some_and(|b| b.meets(rules.min_width, rules.min_height))
}

/// Best-effort human label of a field
///
/// Tries, in order: `<label for=id>`, an enclosing label, `aria-label`,
/// `aria-labelledby`, a preceding sibling with text and the parent's own text.
pub fn get_field_label(doc: &Document, element: NodeId) -> Option<String> {
    let non_empty = |s: String| {
        let trimmed = s.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };

    if let Some(id) = doc.attribute(element, "id").filter(|id| !id.is_empty()) {
        let label = doc
            .descendants(doc.root())
            .into_iter()
            .find(|&n| doc.tag_name(n) == Some("label") && doc.attribute(n, "for") == Some(id));
        if let Some(text) = label.and_then(|l| non_empty(doc.text_content(l))) {
            return Some(text);
        }
    }

    if let Some(label) = doc.ancestors(element).find(|&a| doc.tag_name(a) == Some("label")) {
        if let Some(text) = non_empty(doc.text_content(label)) {
            return Some(text);
        }
    }

    if let Some(text) = doc.attribute(element, "aria-label").and_then(|v| non_empty(v.to_string())) {
        return Some(text);
    }

    if let Some(ids) = doc.attribute(element, "aria-labelledby") {
        let text = ids
            .split_whitespace()
            .filter_map(|id| doc.get_element_by_id(id))
            .map(|n| doc.text_content(n))
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(text) = non_empty(text) {
            return Some(text);
        }
    }

    let mut sibling = doc.previous_sibling(element);
    while let Some(node) = sibling {
        if let Some(text) = non_empty(doc.text_content(node)) {
            return Some(text);
        }
        sibling = doc.previous_sibling(node);
    }

    let parent = doc.parent_element(element)?;
    let own_text: String = doc
        .children(parent)
        .iter()
        .filter_map(|&c| doc.text(c))
        .collect();
    non_empty(own_text)
}

/// Keyword classification over placeholder, label, class, id and name
pub fn classify_by_keywords(doc: &Document, element: NodeId) -> TextFieldContext {
    let mut context = TextFieldContext::for_platform(Platform::Universal);

    let haystack = [
        doc.attribute(element, "placeholder").map(str::to_string),
        get_field_label(doc, element),
        doc.attribute(element, "class").map(str::to_string),
        doc.attribute(element, "id").map(str::to_string),
        doc.attribute(element, "name").map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    let input_type = doc.attribute(element, "type").map(str::to_ascii_lowercase);
    match input_type.as_deref() {
        Some("email") => context = context.with_kind(FieldType::Email, Formality::Professional),
        Some("search") => context = context.with_kind(FieldType::Search, Formality::Neutral),
        _ => {
            if let Some((_, field_type, formality)) = TYPE_KEYWORDS
                .iter()
                .find(|(words, _, _)| words.iter().any(|w| haystack.contains(w)))
            {
                context = context.with_kind(*field_type, *formality);
            }
        }
    }

    if let Some((_, purpose)) = PURPOSE_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| haystack.contains(w)))
    {
        context.purpose = *purpose;
    }

    context
}

/// Value for form controls, text projection otherwise
pub fn read_field_text(doc: &Document, element: NodeId) -> String {
    match doc.element(element) {
        Some(data) if data.is_form_control() => data.value.clone().unwrap_or_default(),
        _ => doc.text_content(element),
    }
}

/// Replace the whole field content and fire input notifications
pub fn write_field_text(doc: &mut Document, element: NodeId, text: &str) -> Result<()> {
    if is_form_control(doc, element)? {
        doc.set_value(element, text)?;
        doc.dispatch_event(element, EventKind::Input);
        doc.dispatch_event(element, EventKind::Change);
        return Ok(());
    }

    let node = doc.replace_children_with_text(element, text)?;
    doc.collapse(BoundaryPoint::new(node, text.chars().count()));
    doc.dispatch_event(element, EventKind::Input);
    Ok(())
}

/// Insert at the caret, replacing the selection if any
///
/// Without a caret inside a rich-text field the text goes at its end.
pub fn insert_field_text(doc: &mut Document, element: NodeId, text: &str) -> Result<()> {
    let inserted = text.chars().count();

    if is_form_control(doc, element)? {
        let value = read_field_text(doc, element);
        let (start, end) = doc.input_selection(element).unwrap_or((0, 0));
        let head: String = value.chars().take(start).collect();
        let tail: String = value.chars().skip(end).collect();
        doc.set_value(element, format!("{}{}{}", head, text, tail))?;
        doc.set_input_selection(element, start + inserted, start + inserted)?;
        doc.dispatch_event(element, EventKind::Input);
        return Ok(());
    }

    let range = match selection_within(doc, element) {
        Some(selection) => DomRange::from_selection(doc, &selection),
        None => DomRange::collapsed(end_of(doc, element)),
    };
    let node = range.replace_with_text(doc, text)?;
    doc.collapse(BoundaryPoint::new(node, inserted));
    doc.dispatch_event(element, EventKind::Input);
    Ok(())
}

/// Replace a non-collapsed selection inside the field
pub fn replace_field_selection(doc: &mut Document, element: NodeId, text: &str) -> Result<bool> {
    let has_selection = if is_form_control(doc, element)? {
        doc.input_selection(element).is_some_and(|(start, end)| start < end)
    } else {
        selection_within(doc, element).is_some_and(|s| !s.is_collapsed())
    };

    if !has_selection {
        return Ok(false);
    }
    insert_field_text(doc, element, text)?;
    Ok(true)
}

/// The document selection, if both of its ends are inside `element`
pub fn selection_within(doc: &Document, element: NodeId) -> Option<Selection> {
    doc.selection()
        .filter(|s| doc.contains(element, s.anchor.node) && doc.contains(element, s.focus.node))
}

fn is_form_control(doc: &Document, element: NodeId) -> Result<bool> {
    doc.element(element)
        .map(|data| data.is_form_control())
        .ok_or_else(|| PenError::NotAnElement(element.to_string()))
}

fn end_of(doc: &Document, element: NodeId) -> BoundaryPoint {
    match doc.text_nodes(element).last() {
        Some(&last) => BoundaryPoint::new(last, doc.node_length(last)),
        None => BoundaryPoint::new(element, doc.node_length(element)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomEvent, ElementNode};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn field(tag: &str) -> ElementNode {
        ElementNode::new(tag).sized(300.0, 40.0)
    }

    fn doc_with(children: Vec<ElementNode>) -> Document {
        Document::from_root("https://example.org", ElementNode::new("body").with_children(children))
    }

    fn by_id(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_validity_filtering() {
        let doc = doc_with(vec![
            field("input").with_attribute("id", "ok").with_attribute("type", "text"),
            field("input").with_attribute("id", "disabled").with_attribute("disabled", ""),
            field("textarea").with_attribute("id", "readonly").with_attribute("readonly", ""),
            field("input").with_attribute("id", "password").with_attribute("type", "password"),
            field("input").with_attribute("id", "hidden").with_visibility(false),
            ElementNode::new("input").with_attribute("id", "tiny").sized(4.0, 4.0),
            ElementNode::new("textarea").with_attribute("id", "unlaid"),
            field("input").with_attribute("id", "checkbox").with_attribute("type", "checkbox"),
        ]);
        let rules = ValidityRules::default();

        assert!(is_valid_text_field(&doc, by_id(&doc, "ok"), &rules));
        for id in ["disabled", "readonly", "password", "hidden", "tiny", "unlaid", "checkbox"] {
            assert!(!is_valid_text_field(&doc, by_id(&doc, id), &rules), "{} should be invalid", id);
        }
        assert!(!is_valid_text_field(&doc, doc.root(), &rules));
    }

    #[test]
    fn test_discover_fields() {
        let doc = doc_with(vec![
            field("input").with_attribute("id", "a"),
            field("input").with_attribute("id", "b").with_attribute("type", "Email"),
            field("textarea").with_attribute("id", "c"),
            field("div").with_attribute("id", "d").with_attribute("contenteditable", "true"),
            field("div").with_attribute("id", "e").with_attribute("contenteditable", ""),
            field("div").with_attribute("id", "f").with_attribute("contenteditable", "false"),
            field("input").with_attribute("id", "g").with_attribute("type", "password"),
        ]);
        let adapter = UniversalAdapter::default();
        let fields = adapter.discover_fields(&doc, doc.root()).unwrap();

        let ids: Vec<&str> = fields.iter().filter_map(|&f| doc.attribute(f, "id")).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d", "e"]);
    }

    #[test]
    fn test_discover_within_scope() {
        let doc = doc_with(vec![
            ElementNode::new("form").with_attribute("id", "form").with_child(field("textarea").with_attribute("id", "inner")),
            field("textarea").with_attribute("id", "outer"),
        ]);
        let adapter = UniversalAdapter::default();
        let fields = adapter.discover_fields(&doc, by_id(&doc, "form")).unwrap();
        assert_eq!(fields, vec![by_id(&doc, "inner")]);
    }

    #[test]
    fn test_label_strategies() {
        let doc = doc_with(vec![
            ElementNode::new("label").with_attribute("for", "by-for").with_text(" Your email "),
            field("input").with_attribute("id", "by-for"),
            ElementNode::new("label").with_text("Wrapped").with_child(field("input").with_attribute("id", "wrapped")),
            field("input").with_attribute("id", "aria").with_attribute("aria-label", "Search query"),
            ElementNode::new("span").with_attribute("id", "t1").with_text("Post"),
            ElementNode::new("span").with_attribute("id", "t2").with_text("title"),
            field("input").with_attribute("id", "labelledby").with_attribute("aria-labelledby", "t1 t2"),
            ElementNode::new("div").with_child(ElementNode::new("h3").with_text("Notes")).with_child(field("textarea").with_attribute("id", "sibling")),
            ElementNode::new("div").with_text("Bio:").with_child(field("textarea").with_attribute("id", "parent")),
            ElementNode::new("div").with_child(field("textarea").with_attribute("id", "none")),
        ]);

        assert_eq!(get_field_label(&doc, by_id(&doc, "by-for")).as_deref(), Some("Your email"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "wrapped")).as_deref(), Some("Wrapped"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "aria")).as_deref(), Some("Search query"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "labelledby")).as_deref(), Some("Post title"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "sibling")).as_deref(), Some("Notes"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "parent")).as_deref(), Some("Bio:"));
        assert_eq!(get_field_label(&doc, by_id(&doc, "none")), None);
    }

    #[test]
    fn test_classify_by_keywords() {
        let doc = doc_with(vec![
            field("textarea").with_attribute("id", "c1").with_attribute("placeholder", "Write a comment..."),
            field("input").with_attribute("id", "c2").with_attribute("type", "email"),
            field("input").with_attribute("id", "c3").with_attribute("name", "q").with_attribute("class", "search-box"),
            field("div").with_attribute("id", "c4").with_attribute("aria-label", "Edit document"),
            field("input").with_attribute("id", "c5").with_attribute("placeholder", "Subject"),
            field("textarea").with_attribute("id", "c6").with_attribute("placeholder", "Type a message to respond"),
            field("textarea").with_attribute("id", "c7"),
            field("input").with_attribute("id", "c8").with_attribute("aria-label", "Search mail").with_attribute("class", "gmail-bar"),
        ]);
        let classify = |id: &str| classify_by_keywords(&doc, by_id(&doc, id));

        let c1 = classify("c1");
        assert_eq!((c1.field_type, c1.formality, c1.purpose), (FieldType::Comment, Formality::Casual, Purpose::Compose));

        assert_eq!(classify("c2").field_type, FieldType::Email);
        assert_eq!(classify("c3").field_type, FieldType::Search);

        let c4 = classify("c4");
        assert_eq!((c4.field_type, c4.formality, c4.purpose), (FieldType::Document, Formality::Formal, Purpose::Edit));

        assert_eq!(classify("c5").field_type, FieldType::Title);
        assert_eq!(classify("c6").purpose, Purpose::Reply);
        assert_eq!(classify("c6").field_type, FieldType::Message);

        assert_eq!(classify("c7"), TextFieldContext::default());
        assert_eq!(classify("c8").field_type, FieldType::Search);
    }

    #[test]
    fn test_write_and_read_form_control() {
        let mut doc = doc_with(vec![field("textarea").with_attribute("id", "t").with_value("old")]);
        let events = Rc::new(RefCell::new(Vec::<DomEvent>::new()));
        let sink = events.clone();
        doc.add_event_listener(move |e| sink.borrow_mut().push(*e));

        let t = by_id(&doc, "t");
        write_field_text(&mut doc, t, "new text").unwrap();

        assert_eq!(read_field_text(&doc, t), "new text");
        let kinds: Vec<EventKind> = events.borrow().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);
    }

    #[test]
    fn test_write_rich_text() {
        let mut doc = doc_with(vec![field("div")
            .with_attribute("id", "ed")
            .with_attribute("contenteditable", "true")
            .with_text("a ")
            .with_child(ElementNode::new("b").with_text("b"))]);
        let ed = by_id(&doc, "ed");

        write_field_text(&mut doc, ed, "replaced").unwrap();
        assert_eq!(read_field_text(&doc, ed), "replaced");
        assert_eq!(doc.children(ed).len(), 1);
        assert!(doc.selection().unwrap().is_collapsed());
    }

    #[test]
    fn test_insert_into_input_selection() {
        let mut doc = doc_with(vec![field("input").with_attribute("id", "i").with_value("Hello world")]);
        let i = by_id(&doc, "i");

        doc.set_input_selection(i, 6, 11).unwrap();
        insert_field_text(&mut doc, i, "there").unwrap();
        assert_eq!(read_field_text(&doc, i), "Hello there");
        assert_eq!(doc.input_selection(i), Some((11, 11)));

        doc.set_input_selection(i, 0, 0).unwrap();
        insert_field_text(&mut doc, i, ">> ").unwrap();
        assert_eq!(read_field_text(&doc, i), ">> Hello there");
        assert_eq!(doc.input_selection(i), Some((3, 3)));
    }

    #[test]
    fn test_insert_into_rich_text() {
        let mut doc = doc_with(vec![field("div")
            .with_attribute("id", "ed")
            .with_attribute("contenteditable", "true")
            .with_text("Hello world")]);
        let ed = by_id(&doc, "ed");
        let text = doc.text_nodes(ed)[0];

        // caret after "Hello"
        doc.collapse(BoundaryPoint::new(text, 5));
        insert_field_text(&mut doc, ed, ",").unwrap();
        assert_eq!(read_field_text(&doc, ed), "Hello, world");

        // no caret inside the field: append
        doc.set_selection(None);
        insert_field_text(&mut doc, ed, "!").unwrap();
        assert_eq!(read_field_text(&doc, ed), "Hello, world!");

        // caret collapses after the inserted text
        let caret = doc.selection().unwrap();
        assert!(caret.is_collapsed());
        assert_eq!(doc.text(caret.anchor.node), Some("!"));
        assert_eq!(caret.anchor.offset, 1);
    }

    #[test]
    fn test_replace_selection() {
        let mut doc = doc_with(vec![
            field("div").with_attribute("id", "ed").with_attribute("contenteditable", "true").with_text("teh cat"),
            field("input").with_attribute("id", "i").with_value("abc"),
        ]);
        let ed = by_id(&doc, "ed");
        let i = by_id(&doc, "i");
        let text = doc.text_nodes(ed)[0];

        doc.collapse(BoundaryPoint::new(text, 2));
        assert!(!replace_field_selection(&mut doc, ed, "the").unwrap());
        assert_eq!(read_field_text(&doc, ed), "teh cat");

        doc.set_selection(Some(Selection { anchor: BoundaryPoint::new(text, 3), focus: BoundaryPoint::new(text, 0) }));
        assert!(replace_field_selection(&mut doc, ed, "the").unwrap());
        assert_eq!(read_field_text(&doc, ed), "the cat");

        assert!(!replace_field_selection(&mut doc, i, "x").unwrap());
        doc.set_input_selection(i, 0, 1).unwrap();
        assert!(replace_field_selection(&mut doc, i, "x").unwrap());
        assert_eq!(read_field_text(&doc, i), "xbc");
    }

    #[test]
    fn test_operations_reject_non_elements() {
        let mut doc = doc_with(vec![ElementNode::new("p").with_text("plain")]);
        let text = doc.text_nodes(doc.root())[0];
        assert!(matches!(write_field_text(&mut doc, text, "x"), Err(PenError::NotAnElement(_))));
    }

    fn empty_editor() -> (Document, NodeId) {
        // fresh compose body: <div contenteditable><br></div>
        let doc = doc_with(vec![field("div")
            .with_attribute("id", "ed")
            .with_attribute("contenteditable", "true")
            .with_child(ElementNode::new("br"))]);
        let ed = by_id(&doc, "ed");
        (doc, ed)
    }

    #[test]
    fn test_insert_after_select_all_in_empty_field() {
        let (mut doc, ed) = empty_editor();
        let adapter = UniversalAdapter::default();

        doc.set_selection(Some(Selection { anchor: BoundaryPoint::new(ed, 0), focus: BoundaryPoint::new(ed, 1) }));
        adapter.insert_at_cursor(&mut doc, ed, "Hello").unwrap();

        assert_eq!(adapter.read_text(&doc, ed), "Hello");
        assert!(doc.children(ed).iter().all(|&c| doc.tag_name(c) != Some("br")));
        let caret = doc.selection().unwrap();
        assert!(caret.is_collapsed());
        assert_eq!(caret.anchor.offset, 5);
    }

    #[test]
    fn test_replace_selection_in_empty_field() {
        let (mut doc, ed) = empty_editor();
        let adapter = UniversalAdapter::default();

        // caret at an element offset: nothing to replace
        doc.collapse(BoundaryPoint::new(ed, 0));
        assert!(!adapter.replace_selection(&mut doc, ed, "Hi").unwrap());

        doc.select_node_contents(ed);
        assert!(adapter.replace_selection(&mut doc, ed, "Hi").unwrap());
        assert_eq!(adapter.read_text(&doc, ed), "Hi");
    }

    #[test]
    fn test_replace_selection_at_element_offsets() {
        let mut doc = doc_with(vec![field("div")
            .with_attribute("id", "ed")
            .with_attribute("contenteditable", "true")
            .with_text("teh ")
            .with_child(ElementNode::new("i").with_text("cat"))]);
        let ed = by_id(&doc, "ed");

        // select-all expressed on the container, as browsers do for Ctrl+A
        doc.set_selection(Some(Selection { anchor: BoundaryPoint::new(ed, 0), focus: BoundaryPoint::new(ed, 2) }));
        assert!(replace_field_selection(&mut doc, ed, "the dog").unwrap());
        assert_eq!(read_field_text(&doc, ed), "the dog");
    }
}
