//! Response payload truncation.
//!
//! Large tool results (a test run dumping tens of thousands of characters
//! of failure output) are cut to a configured character budget before the
//! JSON-RPC envelope is built, so the outer frame stays valid no matter
//! how big the editor's output was. Truncation is prefix-preserving: the
//! `Test Results:` header and summary counts always come first in the
//! payload, so they survive any cut.

use serde::Serialize;

use crate::config::ResponseConfig;

/// Settings mirrored at the `/mcp-settings` HTTP endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TruncationSettings {
    /// Maximum characters in a tool response payload.
    pub response_character_limit: usize,
    /// Whether truncation is applied at all.
    pub enable_truncation: bool,
    /// Marker appended to truncated payloads.
    pub truncation_message: String,
}

/// Cuts oversized text payloads to a character budget.
#[derive(Debug, Clone)]
pub struct ResponseTruncator {
    character_limit: usize,
    enabled: bool,
    marker: String,
}

impl ResponseTruncator {
    /// Creates a truncator from response configuration.
    #[must_use]
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            character_limit: config.character_limit,
            enabled: config.enable_truncation,
            marker: config.truncation_message.clone(),
        }
    }

    /// Returns the settings snapshot served at `/mcp-settings`.
    #[must_use]
    pub fn settings(&self) -> TruncationSettings {
        TruncationSettings {
            response_character_limit: self.character_limit,
            enable_truncation: self.enabled,
            truncation_message: self.marker.clone(),
        }
    }

    /// Applies the character budget to `text`.
    ///
    /// Text within budget (or with truncation disabled) is returned
    /// unchanged. Oversized text is cut to exactly `character_limit`
    /// characters (counted in characters, not bytes, never splitting a
    /// code point) with the marker appended.
    #[must_use]
    pub fn apply(&self, text: String) -> String {
        if !self.enabled || text.chars().count() <= self.character_limit {
            return text;
        }

        let mut truncated: String = text.chars().take(self.character_limit).collect();
        truncated.push_str(&self.marker);
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truncator(limit: usize, enabled: bool) -> ResponseTruncator {
        ResponseTruncator {
            character_limit: limit,
            enabled,
            marker: "\n[truncated]".to_string(),
        }
    }

    #[test]
    fn short_text_unchanged() {
        let t = truncator(100, true);
        assert_eq!(t.apply("hello".to_string()), "hello");
    }

    #[test]
    fn exact_budget_unchanged() {
        let t = truncator(5, true);
        assert_eq!(t.apply("hello".to_string()), "hello");
    }

    #[test]
    fn oversized_text_cut_with_marker() {
        let t = truncator(10, true);
        let out = t.apply("abcdefghijKLMNOP".to_string());
        assert_eq!(out, "abcdefghij\n[truncated]");
    }

    #[test]
    fn disabled_truncation_passes_through() {
        let t = truncator(4, false);
        let long = "x".repeat(50);
        assert_eq!(t.apply(long.clone()), long);
    }

    #[test]
    fn header_survives_the_cut() {
        let t = truncator(40, true);
        let payload = format!("Test Results:\nTotal: 1\nFailed: 1\n{}", "e".repeat(500));
        let out = t.apply(payload);
        assert!(out.starts_with("Test Results:\nTotal: 1\nFailed: 1\n"));
        assert!(out.ends_with("\n[truncated]"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Multibyte characters: the cut must land on a char boundary.
        let t = truncator(3, true);
        let out = t.apply("日本語テスト".to_string());
        assert_eq!(out, "日本語\n[truncated]");
    }

    #[test]
    fn settings_snapshot_serialises_camel_case() {
        let t = truncator(25000, true);
        let json = serde_json::to_string(&t.settings()).unwrap();
        assert!(json.contains(r#""responseCharacterLimit":25000"#));
        assert!(json.contains(r#""enableTruncation":true"#));
        assert!(json.contains(r#""truncationMessage""#));
    }
}
