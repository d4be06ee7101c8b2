//! Flattened-text to DOM mapping and correction application for rich-text fields
//!
//! A contenteditable subtree is flattened into one plain string by walking
//! its text nodes in document order. Corrections address that string; the
//! mapping built alongside it takes each offset back to a text node so the
//! change can be made in place, leaving markup outside the span untouched.
//! Markup inside a replaced span is flattened into the suggestion's single
//! text run.

use crate::correction::{descending, Correction};
use crate::dom::{BoundaryPoint, Document, DomRange, NodeId};
use crate::error::{PenError, Result};
use serde::Serialize;

/// One text node and its span in the flattened text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextNodeEntry {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Ordered, contiguous text-node spans covering a subtree's flattened text
///
/// Derived from the document at one point in time; any mutation invalidates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextNodeMapping {
    entries: Vec<TextNodeEntry>,
    text: String,
    len: usize,
}

/// Which side of a node boundary a position resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    /// Start of a span: `[start, end)` lookup
    Start,
    /// End of a span: `(start, end]` lookup
    End,
}

impl TextNodeMapping {
    /// Flatten the text nodes under `element`
    pub fn extract(doc: &Document, element: NodeId) -> Self {
        let mut mapping = Self::default();
        for node in doc.text_nodes(element) {
            let text = doc.text(node).unwrap_or_default().to_string();
            let start = mapping.len;
            let end = start + text.chars().count();
            mapping.text.push_str(&text);
            mapping.entries.push(TextNodeEntry { node, start, end, text });
            mapping.len = end;
        }
        mapping
    }

    pub fn entries(&self) -> &[TextNodeEntry] {
        &self.entries
    }

    /// The flattened text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the flattened text in characters
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of the `[start, end)` character span, if it lies within the mapping
    pub fn slice(&self, start: usize, end: usize) -> Option<String> {
        (start <= end && end <= self.len).then(|| self.text.chars().skip(start).take(end - start).collect())
    }

    /// Boundary point of a flattened-text position
    ///
    /// A position at the very end resolves to the end of the last text node.
    /// Positions past the end are stale and fail.
    pub fn find_node_at_position(&self, position: usize) -> Result<BoundaryPoint> {
        self.resolve(position, Bias::Start)
    }

    fn resolve(&self, position: usize, bias: Bias) -> Result<BoundaryPoint> {
        let last = self.entries.last().ok_or(PenError::PositionUnresolved(position))?;

        if position > self.len {
            log::warn!("Position {} is beyond the flattened text length {}", position, self.len);
            return Err(PenError::StaleCorrection(format!(
                "position {} beyond text length {}",
                position, self.len
            )));
        }

        let hit = self.entries.iter().find(|e| match bias {
            Bias::Start => e.start <= position && position < e.end,
            Bias::End => e.start < position && position <= e.end,
        });
        match hit {
            Some(entry) => Ok(BoundaryPoint::new(entry.node, position - entry.start)),
            None if position == self.len => {
                log::debug!("Position {} clamped to the end of the last text node", position);
                Ok(BoundaryPoint::new(last.node, last.end - last.start))
            }
            None => Err(PenError::PositionUnresolved(position)),
        }
    }

    /// Live range spanning a correction, checked against the mapping
    pub fn range_for(&self, correction: &Correction) -> Result<DomRange> {
        correction.check_against(self.len, self.slice(correction.start_index, correction.end_index).as_deref())?;
        let start = self.resolve(correction.start_index, Bias::Start)?;
        let end = self.resolve(correction.end_index, Bias::End)?;
        Ok(DomRange::new(start, end))
    }
}

/// A correction paired with the range it covers, for underlining
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightRange {
    pub range: DomRange,
    pub correction: Correction,
}

/// Applies corrections to a rich-text subtree without destroying its markup
#[derive(Debug, Clone, Default)]
pub struct RichTextCorrector {
    mapping: TextNodeMapping,
}

impl RichTextCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the mapping from the current state of `element`
    pub fn extract_text_with_mapping(&mut self, doc: &Document, element: NodeId) -> &TextNodeMapping {
        self.mapping = TextNodeMapping::extract(doc, element);
        &self.mapping
    }

    /// Mapping in effect for [`apply_correction`](Self::apply_correction)
    pub fn mapping(&self) -> &TextNodeMapping {
        &self.mapping
    }

    pub fn find_node_at_position(&self, position: usize) -> Result<BoundaryPoint> {
        self.mapping.find_node_at_position(position)
    }

    /// Replace one span with the correction's suggestion
    ///
    /// Offsets are resolved through the current mapping, which is not
    /// refreshed afterwards. Returns the inserted text node.
    pub fn apply_correction(&self, doc: &mut Document, correction: &Correction) -> Result<NodeId> {
        let range = self.mapping.range_for(correction)?;

        let live = range.covered_text(doc)?;
        if !correction.original.is_empty() && live != correction.original {
            return Err(PenError::StaleCorrection(format!(
                "expected '{}' at {}, document has '{}'",
                correction.original, correction, live
            )));
        }

        let node = range.replace_with_text(doc, &correction.suggestion)?;
        log::debug!("Applied correction {}", correction);
        Ok(node)
    }

    /// Apply a batch of corrections end-first against one mapping
    ///
    /// Corrections that cannot be applied are logged and skipped, as are
    /// corrections overlapping one already applied. Returns the number applied.
    pub fn apply_all_corrections(&mut self, doc: &mut Document, element: NodeId, corrections: &[Correction]) -> usize {
        self.extract_text_with_mapping(doc, element);

        let mut applied: Vec<&Correction> = Vec::new();
        for correction in descending(corrections) {
            if applied.iter().any(|done| done.overlaps(correction)) {
                log::debug!("Skipping correction {} overlapping an applied one", correction);
                continue;
            }
            match self.apply_correction(doc, correction) {
                Ok(_) => applied.push(correction),
                Err(e) => log::warn!("Skipping correction {}: {}", correction, e),
            }
        }

        log::info!("Applied {}/{} corrections", applied.len(), corrections.len());
        applied.len()
    }

    /// Ranges of every resolvable correction, without mutating the document
    pub fn create_highlight_ranges(&mut self, doc: &Document, element: NodeId, corrections: &[Correction]) -> Vec<HighlightRange> {
        self.extract_text_with_mapping(doc, element);

        corrections
            .iter()
            .filter_map(|correction| match self.mapping.range_for(correction) {
                Ok(range) => Some(HighlightRange { range, correction: correction.clone() }),
                Err(e) => {
                    log::debug!("No highlight for correction {}: {}", correction, e);
                    None
                }
            })
            .collect()
    }

    /// Flattened text of the element as it is now
    pub fn get_plain_text(&self, doc: &Document, element: NodeId) -> String {
        doc.text_content(element)
    }
}
