//! Bookkeeping for the text fields currently watched on a page

use crate::adapters::TextFieldAdapter;
use crate::config::PenConfig;
use crate::context::TextFieldContext;
use crate::correction::Correction;
use crate::dom::{Document, NodeId};
use crate::error::{PenError, Result};
use indexmap::IndexMap;
use std::time::{Duration, Instant};

/// A discovered field and its analysis state
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedField {
    pub element: NodeId,
    pub context: TextFieldContext,
    /// Text seen at the last recorded input
    pub last_value: String,
    /// When the pending debounce started, if one is armed
    pub pending_since: Option<Instant>,
    /// Outstanding suggestions for the current text
    pub suggestions: Vec<Correction>,
    pub active: bool,
}

impl ObservedField {
    fn new(element: NodeId, context: TextFieldContext, value: String) -> Self {
        Self {
            element,
            context,
            last_value: value,
            pending_since: None,
            suggestions: Vec::new(),
            active: true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }
}

/// Tracks observed fields and debounces their edits
///
/// Time is passed in by the caller so the integration layer owns the clock.
#[derive(Debug, Clone)]
pub struct FieldObserver {
    fields: IndexMap<NodeId, ObservedField>,
    debounce: Duration,
}

impl FieldObserver {
    pub fn new(config: &PenConfig) -> Self {
        Self::with_debounce(config.debounce())
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self { fields: IndexMap::new(), debounce }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Discover fields with `adapter` and start observing the new ones
    ///
    /// Fields that left the document are dropped. Returns the newly observed ids.
    pub fn observe(&mut self, doc: &Document, adapter: &dyn TextFieldAdapter) -> Result<Vec<NodeId>> {
        let gone: Vec<NodeId> = self.fields.keys().copied().filter(|&id| !doc.is_connected(id)).collect();
        for id in gone {
            log::debug!("Field {} left the document", id);
            self.fields.shift_remove(&id);
        }

        let mut added = Vec::new();
        for element in adapter.discover_fields(doc, doc.root())? {
            if self.fields.contains_key(&element) {
                continue;
            }
            let context = adapter.classify_field(doc, element);
            let value = adapter.read_text(doc, element);
            self.fields.insert(element, ObservedField::new(element, context, value));
            added.push(element);
        }

        if !added.is_empty() {
            log::info!("Observing {} new field(s) with {}", added.len(), adapter.platform_name());
        }
        Ok(added)
    }

    /// Record an edit; re-arms the debounce when the text actually changed
    ///
    /// Returns whether the text changed.
    pub fn record_input(&mut self, doc: &Document, adapter: &dyn TextFieldAdapter, element: NodeId, now: Instant) -> Result<bool> {
        let field = self
            .fields
            .get_mut(&element)
            .ok_or_else(|| PenError::NodeNotFound(format!("{} is not observed", element)))?;
        if !field.active {
            return Ok(false);
        }

        let value = adapter.read_text(doc, element);
        if value == field.last_value {
            return Ok(false);
        }

        field.last_value = value;
        field.suggestions.clear();
        field.pending_since = Some(now);
        Ok(true)
    }

    /// Fields whose quiet period has elapsed at `now`; their debounce is disarmed
    pub fn take_due(&mut self, now: Instant) -> Vec<NodeId> {
        let debounce = self.debounce;
        self.fields
            .values_mut()
            .filter(|f| f.active)
            .filter_map(|field| {
                let since = field.pending_since?;
                (now.saturating_duration_since(since) >= debounce).then(|| {
                    field.pending_since = None;
                    field.element
                })
            })
            .collect()
    }

    pub fn set_suggestions(&mut self, element: NodeId, suggestions: Vec<Correction>) -> Result<()> {
        let field = self
            .fields
            .get_mut(&element)
            .ok_or_else(|| PenError::NodeNotFound(format!("{} is not observed", element)))?;
        field.suggestions = suggestions;
        Ok(())
    }

    pub fn get(&self, element: NodeId) -> Option<&ObservedField> {
        self.fields.get(&element)
    }

    /// Observed fields in discovery order
    pub fn fields(&self) -> impl Iterator<Item = &ObservedField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stop observing a field, returning its final state
    pub fn unregister(&mut self, element: NodeId) -> Option<ObservedField> {
        self.fields.shift_remove(&element).map(|mut field| {
            field.active = false;
            field.pending_since = None;
            field
        })
    }

    /// Drop every field, as on page teardown; returns how many were observed
    pub fn detach_all(&mut self) -> usize {
        let count = self.fields.len();
        self.fields.clear();
        log::debug!("Detached {} field(s)", count);
        count
    }
}
