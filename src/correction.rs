//! Proposed text changes and their application to plain text

use crate::error::{PenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a proposed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionKind {
    Spelling,
    Grammar,
    Punctuation,
    Style,
    #[default]
    #[serde(other)]
    Other,
}

/// One proposed replacement over a span of flattened text
///
/// Offsets are character offsets into the text the correction was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(default)]
    pub original: String,
    pub suggestion: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(rename = "type", default)]
    pub kind: CorrectionKind,
}

impl Correction {
    pub fn new(start_index: usize, end_index: usize, suggestion: impl Into<String>) -> Self {
        Self {
            start_index,
            end_index,
            original: String::new(),
            suggestion: suggestion.into(),
            explanation: String::new(),
            kind: CorrectionKind::Other,
        }
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = original.into();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_kind(mut self, kind: CorrectionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether the two spans share at least one character
    pub fn overlaps(&self, other: &Correction) -> bool {
        self.start_index < other.end_index && other.start_index < self.end_index
    }

    /// Check the span against the text it is about to be applied to
    ///
    /// `covered` is the text currently under the span, when it could be read.
    pub fn check_against(&self, text_len: usize, covered: Option<&str>) -> Result<()> {
        if self.start_index >= self.end_index {
            return Err(PenError::InvalidCorrection(format!(
                "empty or reversed span [{}, {})",
                self.start_index, self.end_index
            )));
        }
        if self.end_index > text_len {
            return Err(PenError::StaleCorrection(format!(
                "span [{}, {}) exceeds text length {}",
                self.start_index, self.end_index, text_len
            )));
        }
        if let Some(covered) = covered {
            if !self.original.is_empty() && covered != self.original {
                return Err(PenError::StaleCorrection(format!(
                    "expected '{}' at [{}, {}), found '{}'",
                    self.original, self.start_index, self.end_index, covered
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) -> '{}'", self.start_index, self.end_index, self.suggestion)
    }
}

/// Corrections ordered from the end of the text toward its beginning
///
/// Ties on the start offset put the longer span first, so the order is total.
pub fn descending(corrections: &[Correction]) -> Vec<&Correction> {
    let mut ordered: Vec<&Correction> = corrections.iter().collect();
    ordered.sort_by(|a, b| {
        b.start_index
            .cmp(&a.start_index)
            .then_with(|| b.end_index.cmp(&a.end_index))
    });
    ordered
}

/// Apply a batch of corrections to a plain string
///
/// Corrections are applied end-first, so every pending span still addresses
/// unchanged text. Invalid, stale or overlapping corrections are skipped.
/// Returns the new text and the number of corrections applied.
pub fn apply_to_plain_text(text: &str, corrections: &[Correction]) -> (String, usize) {
    let mut chars: Vec<char> = text.chars().collect();
    let mut applied: Vec<&Correction> = Vec::new();

    for correction in descending(corrections) {
        if applied.iter().any(|done| done.overlaps(correction)) {
            log::debug!("Skipping correction {} overlapping an applied one", correction);
            continue;
        }

        let covered: Option<String> = chars
            .get(correction.start_index..correction.end_index)
            .map(|span| span.iter().collect());
        if let Err(e) = correction.check_against(chars.len(), covered.as_deref()) {
            log::warn!("Skipping correction {}: {}", correction, e);
            continue;
        }

        chars.splice(correction.start_index..correction.end_index, correction.suggestion.chars());
        applied.push(correction);
    }

    (chars.into_iter().collect(), applied.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_provider_payload() {
        let json = r#"[
            {"startIndex": 2, "endIndex": 6, "original": "seen", "suggestion": "saw",
             "explanation": "Past tense", "type": "grammar"},
            {"startIndex": 0, "endIndex": 1, "suggestion": "I", "type": "capitalization"}
        ]"#;
        let corrections: Vec<Correction> = serde_json::from_str(json).unwrap();

        assert_eq!(corrections[0].kind, CorrectionKind::Grammar);
        assert_eq!(corrections[0].original, "seen");
        assert_eq!(corrections[1].kind, CorrectionKind::Other);
        assert!(corrections[1].original.is_empty());

        let back = serde_json::to_value(&corrections[0]).unwrap();
        assert_eq!(back["startIndex"], 2);
        assert_eq!(back["type"], "grammar");

        let built = Correction::new(2, 6, "saw")
            .with_original("seen")
            .with_explanation("Past tense")
            .with_kind(CorrectionKind::Grammar);
        assert_eq!(corrections[0], built);
    }

    #[test]
    fn test_check_against() {
        let c = Correction::new(2, 6, "saw").with_original("seen");
        assert!(c.check_against(10, Some("seen")).is_ok());
        assert!(matches!(c.check_against(10, Some("seem")), Err(PenError::StaleCorrection(_))));
        assert!(matches!(c.check_against(5, None), Err(PenError::StaleCorrection(_))));
        assert!(matches!(
            Correction::new(3, 3, "x").check_against(10, None),
            Err(PenError::InvalidCorrection(_))
        ));
    }

    #[test]
    fn test_apply_single() {
        let (text, applied) = apply_to_plain_text("I seen him", &[Correction::new(2, 6, "saw")]);
        assert_eq!(text, "I saw him");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_apply_batch_in_any_input_order() {
        let corrections = vec![Correction::new(0, 3, "x"), Correction::new(5, 8, "Y")];
        let (text, applied) = apply_to_plain_text("abc de fgh", &corrections);
        assert_eq!(text, "x dYgh");
        assert_eq!(applied, 2);

        let reversed: Vec<Correction> = corrections.into_iter().rev().collect();
        assert_eq!(apply_to_plain_text("abc de fgh", &reversed).0, "x dYgh");
    }

    #[test]
    fn test_skips_bad_corrections() {
        let corrections = vec![
            Correction::new(0, 5, "Hi").with_original("Hello"),
            Correction::new(4, 7, "o, w"),
            Correction::new(6, 11, "there").with_original("wrong"),
            Correction::new(20, 25, "far"),
            Correction::new(9, 9, "empty"),
        ];
        let (text, applied) = apply_to_plain_text("Hello world", &corrections);
        assert_eq!(text, "Hello, world");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_multibyte_offsets() {
        let (text, _) = apply_to_plain_text("naïve café", &[Correction::new(6, 10, "cafe")]);
        assert_eq!(text, "naïve cafe");
    }
}
