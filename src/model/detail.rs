//! Detail annotations attached to timeline states.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A detail attached to one state in a ticket's history.
///
/// Usually plain text. Structured values are shown as pretty-printed JSON
/// but are only ever edited as text, so an edit collapses them to a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    Text(String),

    /// Any non-string JSON value. A JSON string stored here serializes as
    /// a plain string and reads back as [`Detail::Text`]; build with
    /// [`Detail::from_json`] to avoid that. Until then it reads as text.
    Structured(Value),
}

impl Detail {
    /// Builds a detail from a JSON value, keeping strings as text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            other => Self::Structured(other),
        }
    }

    /// The text, when this detail is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Structured(Value::String(s)) => Some(s),
            Self::Structured(_) => None,
        }
    }

    /// The display form: text verbatim, structured values pretty-printed.
    pub fn rendered(&self) -> String {
        match self {
            Self::Text(s) | Self::Structured(Value::String(s)) => s.clone(),
            // Serializing a `Value` cannot fail.
            Self::Structured(v) => serde_json::to_string_pretty(v).unwrap_or_default(),
        }
    }

    /// Whether a text draft counts as the same value as this detail.
    ///
    /// Structured details never match: there is no attempt to infer
    /// structural equality from text.
    pub fn matches_draft(&self, draft: &str) -> bool {
        self.as_text() == Some(draft)
    }
}

impl From<String> for Detail {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Detail {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn text_renders_verbatim() {
        let detail = Detail::from("  waiting on vendor ");
        assert_eq!(detail.rendered(), "  waiting on vendor ");
    }

    #[test]
    fn structured_renders_pretty() {
        let detail = Detail::Structured(json!({"part": "fan", "qty": 2}));
        assert_eq!(
            detail.rendered(),
            "{\n  \"part\": \"fan\",\n  \"qty\": 2\n}"
        );
        assert!(detail.as_text().is_none());
    }

    #[test]
    fn json_strings_become_text() {
        assert_eq!(Detail::from_json(json!("ok")), Detail::from("ok"));
        assert!(matches!(
            Detail::from_json(json!([1, 2])),
            Detail::Structured(_)
        ));
    }

    #[test]
    fn structured_never_matches_a_draft() {
        let detail = Detail::Structured(json!(5));
        assert!(!detail.matches_draft("5"));
        assert!(!detail.matches_draft(&detail.rendered()));
    }

    #[test]
    fn untagged_serialization_keeps_shape() {
        let text = serde_json::to_string(&Detail::from("ok")).unwrap();
        assert_eq!(text, "\"ok\"");

        let parsed: Detail = serde_json::from_str("{\"bay\":3}").unwrap();
        assert_eq!(parsed, Detail::Structured(json!({"bay": 3})));
    }

    #[test]
    fn structured_string_reads_as_text() {
        let detail = Detail::Structured(json!("fan noisy"));
        assert_eq!(detail.as_text(), Some("fan noisy"));
        assert_eq!(detail.rendered(), "fan noisy");
        assert!(detail.matches_draft("fan noisy"));

        let stored = serde_json::to_string(&detail).unwrap();
        let loaded: Detail = serde_json::from_str(&stored).unwrap();
        assert_eq!(loaded, Detail::from("fan noisy"));
        assert_eq!(loaded.rendered(), detail.rendered());
    }
}
