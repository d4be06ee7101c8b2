//! # intellipen
//!
//! Text-field detection, context inference and formatting-preserving
//! correction for writing assistance layered over arbitrary web pages.
//!
//! ## Features
//!
//! - **Platform adapters**: discover editable surfaces (inputs, textareas,
//!   contenteditable trees) on Gmail, LinkedIn, Notion, Google Docs or any other site
//! - **Context inference**: classify each field's type, formality and purpose
//! - **Adapter loader**: pick the adapter for a hostname, load it once, always keep a fallback
//! - **Rich-text corrector**: map flattened-text offsets back to DOM text nodes and
//!   apply corrections without destroying surrounding markup
//! - **Live capture**: snapshot a real page through headless Chrome (`live` feature)
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use intellipen::{AdapterLoader, Correction, PenConfig, RichTextCorrector, TextFieldAdapter};
//!
//! # async fn run(json: &str) -> intellipen::Result<()> {
//! let mut doc = intellipen::dom::load_document(json)?;
//!
//! // Load the adapter for the page's site
//! let loader = AdapterLoader::new(PenConfig::default());
//! let report = loader.load_adapters_for_current_site(&doc.hostname()).await;
//! let adapter = loader.create_adapter(report.effective_adapter())?;
//!
//! // Discover and classify fields
//! for field in adapter.discover_fields(&doc, doc.root())? {
//!     println!("{:?}", adapter.classify_field(&doc, field));
//! }
//!
//! // Correct a contenteditable field in place
//! # let field = doc.root();
//! let applied = RichTextCorrector::new()
//!     .apply_all_corrections(&mut doc, field, &[Correction::new(2, 6, "saw")]);
//! println!("Applied {} corrections", applied);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: In-process DOM model, selectors, ranges and page capture
//! - [`adapters`]: The text-field capability trait and its platform implementations
//! - [`context`]: Field classification types
//! - [`loader`]: Hostname resolution and adapter loading
//! - [`correction`]: Corrections and their plain-text application
//! - [`richtext`]: Offset mapping and in-place correction of rich-text fields
//! - [`observer`]: Per-field bookkeeping and edit debouncing
//! - [`capability`]: Contract of the writing assistance provider
//! - [`config`]: Runtime configuration
//! - [`error`]: Error types and result aliases

pub mod adapters;
pub mod capability;
pub mod config;
pub mod context;
pub mod correction;
pub mod dom;
pub mod error;
pub mod loader;
pub mod observer;
pub mod richtext;

pub use adapters::{
    GmailAdapter, GoogleDocsAdapter, LinkedInAdapter, NotionAdapter, TextFieldAdapter, UniversalAdapter,
};
pub use capability::{correct_field, Availability, RewriteOptions, WritingCapability};
pub use config::{PenConfig, ValidityRules};
pub use context::{FieldType, Formality, Platform, Purpose, TextFieldContext};
pub use correction::{apply_to_plain_text, Correction, CorrectionKind};
pub use dom::{Document, ElementNode, NodeId, PageSnapshot};
pub use error::{PenError, Result};
pub use loader::{AdapterLoader, PreloadReport, SiteLoadReport};
pub use observer::{FieldObserver, ObservedField};
pub use richtext::{HighlightRange, RichTextCorrector, TextNodeMapping};
