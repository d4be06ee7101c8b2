use crate::dom::element::{hostname_of, BoundingBox, ElementNode, PageSnapshot};
use crate::dom::selector::Selector;
use crate::error::{PenError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Element-specific node data
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag_name: String,

    /// Attributes in source order, names lowercased
    pub attributes: IndexMap<String, String>,

    /// Current value of a form control
    pub value: Option<String>,

    /// Selection of a form control as `(start, end)` character offsets
    pub selection: Option<(usize, usize)>,

    /// Whether the computed style renders the element
    pub is_visible: bool,

    /// Layout box, if the element was laid out
    pub bounding_box: Option<BoundingBox>,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            value: None,
            selection: None,
            is_visible: true,
            bounding_box: None,
        }
    }

    /// Check whether the class attribute contains a token
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    /// Whether this is a form control holding its text in `value`
    pub fn is_form_control(&self) -> bool {
        matches!(self.tag_name.as_str(), "input" | "textarea")
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// A position inside the document: a text node and a character offset, or
/// an element/document node and a child index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The document-level selection (caret when collapsed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: BoundaryPoint,
    pub focus: BoundaryPoint,
}

impl Selection {
    /// A caret at the given point
    pub fn caret(point: BoundaryPoint) -> Self {
        Self { anchor: point, focus: point }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Kind of synthetic event fired after a programmatic edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

/// A synthetic event notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

type Listener = Box<dyn FnMut(&DomEvent)>;

/// Arena-backed live DOM of one page
pub struct Document {
    url: String,
    nodes: Vec<Node>,
    root: NodeId,
    selection: Option<Selection>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("nodes", &self.nodes.len())
            .field("selection", &self.selection)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    /// Create an empty document for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            nodes: vec![Node { parent: None, children: Vec::new(), kind: NodeKind::Document }],
            root: NodeId(0),
            selection: None,
            listeners: Vec::new(),
        }
    }

    /// Build a document from a captured page snapshot
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        Self::from_root(snapshot.url.clone(), snapshot.root.clone())
    }

    /// Build a document whose single top-level element is `root`
    pub fn from_root(url: impl Into<String>, root: ElementNode) -> Self {
        let mut doc = Self::new(url);
        let top = doc.import(&root);
        doc.attach(doc.root, top, None);
        doc
    }

    fn import(&mut self, snapshot: &ElementNode) -> NodeId {
        let id = if snapshot.is_text() {
            self.create_text_node(snapshot.text_content.clone().unwrap_or_default())
        } else {
            let mut data = ElementData::new(snapshot.tag_name.clone());
            data.attributes = snapshot
                .attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect();
            data.value = snapshot.value.clone();
            data.is_visible = snapshot.is_visible;
            data.bounding_box = snapshot.bounding_box;
            if data.is_form_control() {
                let len = data.value.as_deref().map_or(0, |v| v.chars().count());
                data.selection = Some((len, len));
            }
            self.create_element(data)
        };

        for child in &snapshot.children {
            let child_id = self.import(child);
            self.attach(id, child_id, None);
        }

        id
    }

    /// Export a node subtree back into snapshot form
    pub fn to_snapshot(&self, id: NodeId) -> Option<ElementNode> {
        let node = self.nodes.get(id.0)?;
        let mut out = match &node.kind {
            NodeKind::Text(data) => return Some(ElementNode::text(data.clone())),
            NodeKind::Document => ElementNode::new("#document"),
            NodeKind::Element(data) => {
                let mut out = ElementNode::new(data.tag_name.clone());
                out.attributes = data.attributes.clone();
                out.value = data.value.clone();
                out.is_visible = data.is_visible;
                out.bounding_box = data.bounding_box;
                out
            }
        };
        out.children = node.children.iter().filter_map(|&c| self.to_snapshot(c)).collect();
        Some(out)
    }

    /// URL of the page
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host name of the page
    pub fn hostname(&self) -> String {
        hostname_of(&self.url)
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The top-level element (usually `body`)
    pub fn body(&self) -> Option<NodeId> {
        self.children(self.root).iter().copied().find(|&c| self.is_element(c))
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or_else(|| PenError::NodeNotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or_else(|| PenError::NodeNotFound(id.to_string()))
    }

    // ----- node creation & inspection -----

    /// Create a detached element
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.push(NodeKind::Element(data))
    }

    /// Create a detached text node
    pub fn create_text_node(&mut self, data: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(data.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent: None, children: Vec::new(), kind });
        id
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0).map(|n| &n.kind), Some(NodeKind::Element(_)))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    /// Element data of a node, if it is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable element data of a node
    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(data) => Ok(data),
            _ => Err(PenError::NotAnElement(id.to_string())),
        }
    }

    /// Data of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    /// Replace the data of a text node
    pub fn set_text(&mut self, id: NodeId, data: impl Into<String>) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(text) => {
                *text = data.into();
                Ok(())
            }
            _ => Err(PenError::NotATextNode(id.to_string())),
        }
    }

    /// Character length of a node: text length for text nodes, child count otherwise
    pub fn node_length(&self, id: NodeId) -> usize {
        match self.nodes.get(id.0) {
            Some(Node { kind: NodeKind::Text(data), .. }) => data.chars().count(),
            Some(node) => node.children.len(),
            None => 0,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.into());
        Ok(())
    }

    /// Class tokens of an element
    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class_name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class_name))
    }

    // ----- tree navigation -----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Parent node if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Ancestors from the parent upwards
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { doc: self, next: self.parent(id) }
    }

    /// Whether `node` is `ancestor` itself or inside its subtree
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Index of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    /// All nodes of the subtree in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Text nodes of the subtree in document order
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        if self.is_text(id) {
            return vec![id];
        }
        self.descendants(id).into_iter().filter(|&n| self.is_text(n)).collect()
    }

    /// Concatenated data of every text node in the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Elements of the subtree matching the selector, in document order
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    /// First element of the subtree matching the selector
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope).into_iter().find(|&n| selector.matches(self, n))
    }

    /// Find the element with the given id attribute
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(element_id))
    }

    /// Whether the element is editable as rich text
    ///
    /// `contenteditable` is inherited; an explicit `"false"` stops inheritance.
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        for node in std::iter::once(id).chain(self.ancestors(id)) {
            match self.attribute(node, "contenteditable").map(str::to_ascii_lowercase).as_deref() {
                Some("" | "true" | "plaintext-only") => return true,
                Some("false") => return false,
                _ => {}
            }
        }
        false
    }

    /// Whether the element is a visible, rendered node (self and ancestors)
    pub fn is_rendered(&self, id: NodeId) -> bool {
        std::iter::once(id).chain(self.ancestors(id)).all(|n| match self.element(n) {
            Some(data) => data.is_visible && !data.attributes.contains_key("hidden"),
            None => true,
        })
    }

    // ----- mutation -----

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
    }

    /// Remove a node from its parent; the node stays in the arena, detached
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
        Ok(())
    }

    /// Append a node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    /// Insert a node at a child index of `parent`
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.contains(child, parent) {
            return Err(PenError::NodeNotFound(format!("{} cannot contain its ancestor {}", parent, child)));
        }
        if self.is_text(parent) {
            return Err(PenError::NotAnElement(parent.to_string()));
        }
        self.detach(child)?;
        self.attach(parent, child, index);
        Ok(())
    }

    /// Split a text node at a character offset; returns the new node holding the tail
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let data = self.text(id).ok_or_else(|| PenError::NotATextNode(id.to_string()))?;
        let length = data.chars().count();
        if offset > length {
            return Err(PenError::IndexSize { offset, length });
        }
        let byte = char_to_byte(data, offset);
        let (head, tail) = (data[..byte].to_string(), data[byte..].to_string());

        self.set_text(id, head)?;
        let tail_node = self.create_text_node(tail);
        if let Some(parent) = self.parent(id) {
            let index = self.index_in_parent(id).map(|i| i + 1);
            self.attach(parent, tail_node, index);
        }
        Ok(tail_node)
    }

    /// Replace every child of an element with a single text node
    pub fn replace_children_with_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let children: Vec<NodeId> = self.node(id)?.children.clone();
        for child in children {
            self.detach(child)?;
        }
        let text_node = self.create_text_node(text);
        self.append_child(id, text_node)?;
        Ok(text_node)
    }

    /// Current value of a form control
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id)?.value.as_deref()
    }

    /// Set the value of a form control, placing its caret at the end
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        let data = self.element_mut(id)?;
        let value = value.into();
        let len = value.chars().count();
        data.value = Some(value);
        data.selection = Some((len, len));
        Ok(())
    }

    /// Selection of a form control as `(start, end)` character offsets
    pub fn input_selection(&self, id: NodeId) -> Option<(usize, usize)> {
        let data = self.element(id)?;
        let len = data.value.as_deref().map_or(0, |v| v.chars().count());
        let (start, end) = data.selection.unwrap_or((len, len));
        Some((start.min(len), end.min(len)))
    }

    /// Set the selection of a form control
    pub fn set_input_selection(&mut self, id: NodeId, start: usize, end: usize) -> Result<()> {
        let data = self.element_mut(id)?;
        data.selection = Some((start.min(end), start.max(end)));
        Ok(())
    }

    // ----- selection -----

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Collapse the selection to a caret
    pub fn collapse(&mut self, point: BoundaryPoint) {
        self.selection = Some(Selection::caret(point));
    }

    /// Select every character inside an element
    pub fn select_node_contents(&mut self, id: NodeId) {
        let texts = self.text_nodes(id);
        self.selection = match (texts.first(), texts.last()) {
            (Some(&first), Some(&last)) => Some(Selection {
                anchor: BoundaryPoint::new(first, 0),
                focus: BoundaryPoint::new(last, self.node_length(last)),
            }),
            _ => Some(Selection {
                anchor: BoundaryPoint::new(id, 0),
                focus: BoundaryPoint::new(id, self.node_length(id)),
            }),
        };
    }

    // ----- events -----

    /// Register a listener notified of every synthetic event
    pub fn add_event_listener(&mut self, listener: impl FnMut(&DomEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Notify listeners that `target` changed
    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        let event = DomEvent { target, kind };
        log::trace!("dispatching {:?} on {}", kind, target);
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Byte index of a character offset, clamped to the string length
pub fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices().nth(offset).map_or(text.len(), |(i, _)| i)
}
