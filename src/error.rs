use thiserror::Error;

/// Errors raised by field discovery, adapter loading and correction application
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PenError {
    /// A selector string could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A node handle does not belong to the document
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// An element operation was attempted on a non-element node
    #[error("Node is not an element: {0}")]
    NotAnElement(String),

    /// A text operation was attempted on a non-text node
    #[error("Node is not a text node: {0}")]
    NotATextNode(String),

    /// An offset lies outside the addressed node
    #[error("Offset {offset} out of bounds (length {length})")]
    IndexSize { offset: usize, length: usize },

    /// No adapter with the given name is known to the adapter source
    #[error("Adapter not found: {0}")]
    AdapterNotFound(String),

    /// The adapter source ran but the expected adapter was never registered
    #[error("Adapter {0} did not register itself after loading")]
    AdapterNotRegistered(String),

    /// The adapter source failed while loading an adapter
    #[error("Failed to load adapter {name}: {reason}")]
    AdapterLoadFailed { name: String, reason: String },

    /// A flattened-text position could not be mapped back to a text node
    #[error("Could not resolve text position {0}")]
    PositionUnresolved(usize),

    /// A correction was computed against text that has since changed
    #[error("Stale correction: {0}")]
    StaleCorrection(String),

    /// A correction violates its own span invariants
    #[error("Invalid correction: {0}")]
    InvalidCorrection(String),

    /// The AI capability provider is not available on this device
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The AI capability provider failed mid-request
    #[error("Capability request failed: {0}")]
    CapabilityFailed(String),

    /// A page snapshot could not be captured or parsed
    #[error("Snapshot failed: {0}")]
    SnapshotFailed(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigFailed(String),
}

impl PenError {
    /// Whether the error means "feature unavailable" rather than a bug
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PenError::CapabilityUnavailable(_))
    }

    /// Whether the error affects a single correction only and can be skipped in a batch
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            PenError::PositionUnresolved(_)
                | PenError::StaleCorrection(_)
                | PenError::InvalidCorrection(_)
                | PenError::IndexSize { .. }
        )
    }
}

/// Result type alias for IntelliPen operations
pub type Result<T> = std::result::Result<T, PenError>;
