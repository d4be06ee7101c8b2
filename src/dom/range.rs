use crate::dom::document::{char_to_byte, BoundaryPoint, Document, Selection};
use crate::dom::NodeId;
use crate::error::{PenError, Result};
use serde::{Deserialize, Serialize};

/// A span of the document between two boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomRange {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl DomRange {
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// A collapsed range at a single point
    pub fn collapsed(point: BoundaryPoint) -> Self {
        Self { start: point, end: point }
    }

    /// Range covering a selection, with anchor and focus in document order
    pub fn from_selection(doc: &Document, selection: &Selection) -> Self {
        Self::new(selection.anchor, selection.focus).ordered(doc)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Swap the boundary points if they are in reverse document order
    pub fn ordered(self, doc: &Document) -> Self {
        let (Some(start), Some(end)) = (normalize_boundary(doc, self.start), normalize_boundary(doc, self.end))
        else {
            return self;
        };
        if compare_points(doc, &start, &end).is_gt() {
            Self { start: self.end, end: self.start }
        } else {
            self
        }
    }

    /// Text covered by the range, without touching the document
    pub fn covered_text(&self, doc: &Document) -> Result<String> {
        if self.is_collapsed() {
            return Ok(String::new());
        }
        if self.element_span(doc)?.is_some() {
            return Ok(String::new());
        }
        let (start, end) = self.text_boundaries(doc)?;
        let texts = doc.text_nodes(doc.root());
        let from = position_of(&texts, start.node)?;
        let to = position_of(&texts, end.node)?;

        let mut out = String::new();
        for (i, &node) in texts.iter().enumerate().take(to + 1).skip(from) {
            let data = doc.text(node).unwrap_or_default();
            let lo = if i == from { char_to_byte(data, start.offset) } else { 0 };
            let hi = if i == to { char_to_byte(data, end.offset) } else { data.len() };
            if lo < hi {
                out.push_str(&data[lo..hi]);
            }
        }
        Ok(out)
    }

    /// Remove the range contents from the document
    ///
    /// Text nodes cut by a boundary keep their outside part; nodes entirely
    /// between the boundaries are detached; elements that contain a
    /// boundary stay in place. A range with no text on either side, such as
    /// an empty editor holding only a `<br>`, detaches the children between
    /// its two offsets. Returns the collapsed insertion point.
    pub fn delete_contents(&self, doc: &mut Document) -> Result<BoundaryPoint> {
        if self.is_collapsed() {
            return Ok(self.start);
        }
        if let Some((container, lo, hi)) = self.element_span(doc)? {
            let doomed = doc.children(container)[lo..hi].to_vec();
            for node in doomed {
                doc.detach(node)?;
            }
            return Ok(BoundaryPoint::new(container, lo));
        }
        let (start, end) = self.text_boundaries(doc)?;

        if start.node == end.node {
            let data = doc.text(start.node).unwrap_or_default();
            let lo = char_to_byte(data, start.offset);
            let hi = char_to_byte(data, end.offset);
            let remaining = format!("{}{}", &data[..lo], &data[hi..]);
            doc.set_text(start.node, remaining)?;
            return Ok(start);
        }

        let order = doc.descendants(doc.root());
        let from = position_of(&order, start.node)?;
        let to = position_of(&order, end.node)?;

        let mut removed: Vec<NodeId> = Vec::new();
        for &node in &order[from + 1..to] {
            if doc.contains(node, end.node) {
                continue;
            }
            if removed.iter().any(|&r| doc.contains(r, node)) {
                continue;
            }
            doc.detach(node)?;
            removed.push(node);
        }

        let head = {
            let data = doc.text(start.node).unwrap_or_default();
            data[..char_to_byte(data, start.offset)].to_string()
        };
        let tail = {
            let data = doc.text(end.node).unwrap_or_default();
            data[char_to_byte(data, end.offset)..].to_string()
        };
        doc.set_text(start.node, head)?;
        doc.set_text(end.node, tail)?;

        Ok(start)
    }

    /// Delete the range contents and put `text` in their place as one text node
    pub fn replace_with_text(&self, doc: &mut Document, text: &str) -> Result<NodeId> {
        let point = self.delete_contents(doc)?;
        insert_text(doc, point, text)
    }

    /// Container and child offsets of a range within one element that has
    /// no text to anchor either boundary on
    fn element_span(&self, doc: &Document) -> Result<Option<(NodeId, usize, usize)>> {
        let container = self.start.node;
        if container != self.end.node
            || doc.is_text(container)
            || normalize_boundary(doc, self.start).is_some()
            || normalize_boundary(doc, self.end).is_some()
        {
            return Ok(None);
        }
        let lo = self.start.offset.min(self.end.offset);
        let hi = self.start.offset.max(self.end.offset);
        let length = doc.node_length(container);
        if hi > length {
            return Err(PenError::IndexSize { offset: hi, length });
        }
        Ok(Some((container, lo, hi)))
    }

    fn text_boundaries(&self, doc: &Document) -> Result<(BoundaryPoint, BoundaryPoint)> {
        let start = normalize_boundary(doc, self.start).ok_or_else(|| PenError::NotATextNode(self.start.node.to_string()))?;
        let end = normalize_boundary(doc, self.end).ok_or_else(|| PenError::NotATextNode(self.end.node.to_string()))?;
        for point in [&start, &end] {
            let length = doc.node_length(point.node);
            if point.offset > length {
                return Err(PenError::IndexSize { offset: point.offset, length });
            }
        }
        if compare_points(doc, &start, &end).is_gt() {
            Ok((end, start))
        } else {
            Ok((start, end))
        }
    }
}

/// Insert `text` as a new text node at a boundary point
///
/// A text node cut by the point is split so the new node sits between the halves.
pub fn insert_text(doc: &mut Document, point: BoundaryPoint, text: &str) -> Result<NodeId> {
    let length = doc.node_length(point.node);
    if point.offset > length {
        return Err(PenError::IndexSize { offset: point.offset, length });
    }
    let new_node = doc.create_text_node(text);

    if !doc.is_text(point.node) {
        doc.insert_child(point.node, new_node, Some(point.offset))?;
        return Ok(new_node);
    }

    let parent = doc
        .parent(point.node)
        .ok_or_else(|| PenError::NodeNotFound(format!("{} has no parent", point.node)))?;
    let index = doc.index_in_parent(point.node).unwrap_or_default();

    let at = if point.offset == 0 {
        index
    } else if point.offset == length {
        index + 1
    } else {
        doc.split_text(point.node, point.offset)?;
        index + 1
    };
    doc.insert_child(parent, new_node, Some(at))?;
    Ok(new_node)
}

/// Express an element boundary as a text boundary when the element has text
fn normalize_boundary(doc: &Document, point: BoundaryPoint) -> Option<BoundaryPoint> {
    if doc.is_text(point.node) {
        return Some(point);
    }
    let children = doc.children(point.node);
    let offset = point.offset.min(children.len());

    children[offset..]
        .iter()
        .find_map(|&c| doc.text_nodes(c).first().map(|&t| BoundaryPoint::new(t, 0)))
        .or_else(|| {
            children[..offset].iter().rev().find_map(|&c| {
                doc.text_nodes(c)
                    .last()
                    .map(|&t| BoundaryPoint::new(t, doc.node_length(t)))
            })
        })
}

fn compare_points(doc: &Document, a: &BoundaryPoint, b: &BoundaryPoint) -> std::cmp::Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    let order = doc.descendants(doc.root());
    let pa = order.iter().position(|&n| n == a.node);
    let pb = order.iter().position(|&n| n == b.node);
    pa.cmp(&pb)
}

fn position_of(nodes: &[NodeId], node: NodeId) -> Result<usize> {
    nodes
        .iter()
        .position(|&n| n == node)
        .ok_or_else(|| PenError::NodeNotFound(format!("{} is not connected", node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    // <div>Th<b>is i</b>s wrng</div>
    fn create_test_document() -> (Document, NodeId) {
        let root = ElementNode::new("body").with_child(
            ElementNode::new("div")
                .with_attribute("id", "editor")
                .with_text("Th")
                .with_child(ElementNode::new("b").with_text("is i"))
                .with_text("s wrng"),
        );
        let doc = Document::from_root("https://example.org", root);
        let editor = doc.get_element_by_id("editor").unwrap();
        (doc, editor)
    }

    #[test]
    fn test_delete_within_single_node() {
        let (mut doc, editor) = create_test_document();
        let last = doc.text_nodes(editor)[2];

        let range = DomRange::new(BoundaryPoint::new(last, 2), BoundaryPoint::new(last, 6));
        assert_eq!(range.covered_text(&doc).unwrap(), "wrng");

        let node = range.replace_with_text(&mut doc, "wrong").unwrap();
        assert_eq!(doc.text(node), Some("wrong"));
        assert_eq!(doc.text_content(editor), "This is wrong");
    }

    #[test]
    fn test_delete_across_element_boundary() {
        let (mut doc, editor) = create_test_document();
        let texts = doc.text_nodes(editor);

        // "This" spans the first text node and the <b> element
        let range = DomRange::new(BoundaryPoint::new(texts[0], 0), BoundaryPoint::new(texts[1], 2));
        assert_eq!(range.covered_text(&doc).unwrap(), "This");

        range.replace_with_text(&mut doc, "That").unwrap();
        assert_eq!(doc.text_content(editor), "That is wrng");

        // The <b> element partially inside the range is kept
        let bold = doc.children(editor).iter().copied().find(|&c| doc.tag_name(c) == Some("b"));
        assert_eq!(bold.map(|b| doc.text_content(b)), Some(" i".to_string()));
    }

    #[test]
    fn test_delete_removes_contained_elements() {
        let (mut doc, editor) = create_test_document();
        let texts = doc.text_nodes(editor);

        let range = DomRange::new(BoundaryPoint::new(texts[0], 1), BoundaryPoint::new(texts[2], 1));
        range.replace_with_text(&mut doc, "-").unwrap();

        assert_eq!(doc.text_content(editor), "T- wrng");
        assert!(doc.children(editor).iter().all(|&c| doc.tag_name(c) != Some("b")));
    }

    #[test]
    fn test_reversed_range_is_ordered() {
        let (doc, editor) = create_test_document();
        let texts = doc.text_nodes(editor);

        let range = DomRange::new(BoundaryPoint::new(texts[2], 1), BoundaryPoint::new(texts[0], 1)).ordered(&doc);
        assert_eq!(range.start.node, texts[0]);
        assert_eq!(range.covered_text(&doc).unwrap(), "his is");
    }

    #[test]
    fn test_insert_text_at_element_boundary() {
        let root = ElementNode::new("body").with_child(ElementNode::new("div").with_attribute("id", "empty"));
        let mut doc = Document::from_root("https://example.org", root);
        let empty = doc.get_element_by_id("empty").unwrap();

        insert_text(&mut doc, BoundaryPoint::new(empty, 0), "typed").unwrap();
        assert_eq!(doc.text_content(empty), "typed");
    }

    #[test]
    fn test_insert_text_splits_node() {
        let (mut doc, editor) = create_test_document();
        let first = doc.text_nodes(editor)[0];

        insert_text(&mut doc, BoundaryPoint::new(first, 1), "~").unwrap();
        assert_eq!(doc.text_content(editor), "T~his is wrng");
        assert_eq!(doc.text_nodes(editor).len(), 5);
    }

    #[test]
    fn test_out_of_bounds_offsets() {
        let (mut doc, editor) = create_test_document();
        let first = doc.text_nodes(editor)[0];

        let range = DomRange::new(BoundaryPoint::new(first, 0), BoundaryPoint::new(first, 9));
        assert_eq!(
            range.delete_contents(&mut doc),
            Err(PenError::IndexSize { offset: 9, length: 2 })
        );
        assert_eq!(doc.text_content(editor), "This is wrng");
    }

    #[test]
    fn test_element_offsets_resolve_to_text() {
        let (mut doc, editor) = create_test_document();

        // (editor, 1) sits before <b>, (editor, 3) after the last text node
        let range = DomRange::new(BoundaryPoint::new(editor, 1), BoundaryPoint::new(editor, 3));
        assert_eq!(range.covered_text(&doc).unwrap(), "is is wrng");

        range.replace_with_text(&mut doc, "at").unwrap();
        assert_eq!(doc.text_content(editor), "That");

        // the start resolved into <b>, so the replacement lands there
        let bold = doc.children(editor).iter().copied().find(|&c| doc.tag_name(c) == Some("b"));
        assert_eq!(bold.map(|b| doc.text_content(b)), Some("at".to_string()));
    }

    #[test]
    fn test_replace_in_element_only_field() {
        // <div contenteditable><br></div>
        let root = ElementNode::new("body").with_child(
            ElementNode::new("div")
                .with_attribute("id", "ed")
                .with_attribute("contenteditable", "true")
                .with_child(ElementNode::new("br")),
        );
        let mut doc = Document::from_root("https://example.org", root);
        let ed = doc.get_element_by_id("ed").unwrap();

        let past_end = DomRange::new(BoundaryPoint::new(ed, 0), BoundaryPoint::new(ed, 4));
        assert_eq!(
            past_end.delete_contents(&mut doc),
            Err(PenError::IndexSize { offset: 4, length: 1 })
        );

        let range = DomRange::new(BoundaryPoint::new(ed, 0), BoundaryPoint::new(ed, 1));
        assert_eq!(range.covered_text(&doc).unwrap(), "");

        let node = range.replace_with_text(&mut doc, "Hello").unwrap();
        assert_eq!(doc.children(ed), &[node]);
        assert_eq!(doc.text_content(ed), "Hello");
    }
}
