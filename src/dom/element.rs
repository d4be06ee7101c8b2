use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// Tag name used for text nodes in a snapshot
pub const TEXT_NODE_TAG: &str = "#text";

/// Serializable snapshot of a DOM node
///
/// Elements carry a tag name, attributes and children; text nodes use the
/// [`TEXT_NODE_TAG`] tag name and carry their data in `text_content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "textarea", "input") or `#text`
    pub tag_name: String,

    /// Element attributes (e.g., id, class, placeholder, contenteditable)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,

    /// Data of a text node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Current value of a form control (input/textarea)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Child nodes in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Whether the computed style renders the element (display and visibility)
    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Bounding box information (x, y, width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

fn default_visible() -> bool {
    true
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new element node
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            text_content: None,
            value: None,
            children: Vec::new(),
            is_visible: true,
            bounding_box: None,
        }
    }

    /// Create a new text node
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            tag_name: TEXT_NODE_TAG.to_string(),
            text_content: Some(data.into()),
            ..Self::new(TEXT_NODE_TAG)
        }
    }

    /// Builder method: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Self::text(text));
        self
    }

    /// Builder method: append a child node
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set the form control value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Builder method: set a bounding box of the given size at the origin
    pub fn sized(self, width: f64, height: f64) -> Self {
        self.with_bounding_box(0.0, 0.0, width, height)
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// Add a child node
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this snapshot node is a text node
    pub fn is_text(&self) -> bool {
        self.tag_name == TEXT_NODE_TAG
    }

    /// Count nodes in this subtree, including this one
    pub fn count_nodes(&self) -> usize {
        1 + self.children.iter().map(ElementNode::count_nodes).sum::<usize>()
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Check whether the box meets a minimum footprint
    pub fn meets(&self, min_width: f64, min_height: f64) -> bool {
        self.width >= min_width && self.height >= min_height
    }

    /// Calculate the area of the bounding box
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A page as captured from a browser: its URL and the body subtree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSnapshot {
    /// URL the snapshot was taken from
    pub url: String,

    /// Root element (usually `body`)
    pub root: ElementNode,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, root: ElementNode) -> Self {
        Self { url: url.into(), root }
    }

    /// Host name component of the snapshot URL, lowercased
    pub fn hostname(&self) -> String {
        hostname_of(&self.url)
    }
}

/// Host name of an absolute URL, lowercased; empty when the URL has none
pub fn hostname_of(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let element = ElementNode::new("TEXTAREA")
            .with_attribute("id", "comment-box")
            .with_attribute("class", "form-control large")
            .with_value("hello")
            .sized(300.0, 80.0);

        assert_eq!(element.tag_name, "textarea");
        assert_eq!(element.id(), Some(&"comment-box".to_string()));
        assert!(element.has_class("large"));
        assert!(!element.has_class("small"));
        assert_eq!(element.value.as_deref(), Some("hello"));
        assert!(element.is_visible);
        assert_eq!(element.bounding_box.map(|b| b.area()), Some(24000.0));
    }

    #[test]
    fn test_text_nodes() {
        let p = ElementNode::new("p")
            .with_text("Hello ")
            .with_child(ElementNode::new("b").with_text("world"));

        assert!(p.children[0].is_text());
        assert_eq!(p.children[0].text_content.as_deref(), Some("Hello "));
        assert!(p.children[1].is_tag("b"));
        assert_eq!(p.count_nodes(), 4);
    }

    #[test]
    fn test_serialization_defaults() {
        let json = r##"{"tag_name": "div", "children": [{"tag_name": "#text", "text_content": "hi"}]}"##;
        let node: ElementNode = serde_json::from_str(json).unwrap();

        assert!(node.is_visible);
        assert!(node.bounding_box.is_none());
        assert!(node.children[0].is_text());

        let round = serde_json::to_string(&node).unwrap();
        let back: ElementNode = serde_json::from_str(&round).unwrap();
        assert_eq!(node, back);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);

        assert!(bbox.is_visible());
        assert!(bbox.meets(20.0, 15.0));
        assert!(!bbox.meets(120.0, 15.0));

        let invisible_bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        assert!(!invisible_bbox.is_visible());
    }

    #[test]
    fn test_hostname_of() {
        assert_eq!(hostname_of("https://mail.google.com/mail/u/0/#inbox"), "mail.google.com");
        assert_eq!(hostname_of("http://user:pw@Example.org:8080/path"), "example.org");
        assert_eq!(hostname_of("http://[::1]:8080/x"), "[::1]");
        assert_eq!(hostname_of("www.notion.so"), "");
        assert_eq!(hostname_of("about:blank"), "");
        assert_eq!(hostname_of("mailto:someone@mail.google.com"), "");
    }
}
