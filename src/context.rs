//! Inferred semantics of a discovered text field

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of text the field holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    General,
    Email,
    EmailSubject,
    EmailBody,
    Comment,
    Message,
    SocialPost,
    Social,
    Document,
    Title,
    Search,
    Article,
    Suggestion,
}

/// Expected register of the text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Formality {
    #[default]
    Neutral,
    Casual,
    Formal,
    Professional,
}

/// What the user is doing in the field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    #[default]
    Unknown,
    Compose,
    Edit,
    Reply,
}

/// Site an adapter is specialized for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    #[default]
    Universal,
    Gmail,
    #[serde(rename = "linkedin")]
    LinkedIn,
    Notion,
    GoogleDocs,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Gmail,
        Platform::LinkedIn,
        Platform::Notion,
        Platform::GoogleDocs,
        Platform::Universal,
    ];

    /// Platform identifier tag
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Universal => "universal",
            Platform::Gmail => "gmail",
            Platform::LinkedIn => "linkedin",
            Platform::Notion => "notion",
            Platform::GoogleDocs => "google-docs",
        }
    }

    /// Name the adapter for this platform registers under
    pub fn adapter_name(self) -> &'static str {
        match self {
            Platform::Universal => "UniversalAdapter",
            Platform::Gmail => "GmailAdapter",
            Platform::LinkedIn => "LinkedInAdapter",
            Platform::Notion => "NotionAdapter",
            Platform::GoogleDocs => "GoogleDocsAdapter",
        }
    }

    pub fn from_adapter_name(name: &str) -> Option<Platform> {
        Self::ALL.into_iter().find(|p| p.adapter_name() == name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete classification of a text field
///
/// Every field is always set; unmatched heuristics leave the defaults
/// general / neutral / unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFieldContext {
    pub field_type: FieldType,
    pub formality: Formality,
    pub purpose: Purpose,
    pub platform: Platform,
}

impl TextFieldContext {
    /// Default context owned by a platform
    pub fn for_platform(platform: Platform) -> Self {
        Self { platform, ..Self::default() }
    }

    /// Builder method: set field type and formality together
    pub fn with_kind(mut self, field_type: FieldType, formality: Formality) -> Self {
        self.field_type = field_type;
        self.formality = formality;
        self
    }

    /// Builder method: set the purpose
    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = purpose;
        self
    }
}
