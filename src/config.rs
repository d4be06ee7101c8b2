//! Runtime configuration

use crate::error::{PenError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Thresholds a candidate element must meet to count as a text field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityRules {
    /// Minimum rendered width in CSS pixels
    pub min_width: f64,

    /// Minimum rendered height in CSS pixels
    pub min_height: f64,
}

impl Default for ValidityRules {
    fn default() -> Self {
        Self { min_width: 20.0, min_height: 15.0 }
    }
}

/// IntelliPen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenConfig {
    /// Field validity thresholds
    pub validity: ValidityRules,

    /// Quiet period after the last edit before a field is analyzed
    pub debounce_ms: u64,

    /// Additional host token to adapter name mappings, checked after the built-in table
    pub extra_hosts: IndexMap<String, String>,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            validity: ValidityRules::default(),
            debounce_ms: 1000,
            extra_hosts: IndexMap::new(),
        }
    }
}

impl PenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the minimum field footprint
    pub fn min_field_size(mut self, width: f64, height: f64) -> Self {
        self.validity = ValidityRules { min_width: width, min_height: height };
        self
    }

    /// Builder method: set the debounce delay
    pub fn debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// Builder method: route hosts containing `token` to `adapter`
    pub fn extra_host(mut self, token: impl Into<String>, adapter: impl Into<String>) -> Self {
        self.extra_hosts.insert(token.into().to_ascii_lowercase(), adapter.into());
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PenError::ConfigFailed(format!("Invalid configuration: {}", e)))
    }

    /// Read a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PenError::ConfigFailed(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = PenConfig::new()
            .min_field_size(40.0, 20.0)
            .debounce_ms(250)
            .extra_host("mail.example.com", "GmailAdapter");

        assert_eq!(config.validity.min_width, 40.0);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.extra_hosts.get("mail.example.com").map(String::as_str), Some("GmailAdapter"));
    }

    #[test]
    fn test_partial_json() {
        let config = PenConfig::from_json_str(r#"{"debounce_ms": 300, "validity": {"min_width": 5}}"#).unwrap();

        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.validity.min_width, 5.0);
        assert_eq!(config.validity.min_height, 15.0);
        assert!(config.extra_hosts.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(PenConfig::from_json_str("[1, 2]"), Err(PenError::ConfigFailed(_))));
        assert!(matches!(
            PenConfig::from_json_file("/nonexistent/intellipen.json"),
            Err(PenError::ConfigFailed(_))
        ));
    }
}
