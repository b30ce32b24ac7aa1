//! Fallback-chain field lookups over loosely-shaped documents.
//!
//! Client apps have written the same logical field under several names over
//! time (`text` / `mensaje`, `recipientId` / `toId` / ...). Lookups take the
//! candidates in priority order and return the first one that carries a
//! usable value.

use serde_json::{Map, Value};

/// Whether a field value counts as set.
///
/// Null, `false`, numeric zero and the empty string are unset. Arrays and
/// maps always count as set, even when empty.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present value among `candidates`, in order.
pub fn first_present<'a>(fields: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| is_present(value))
}

/// First present value among `candidates`, rendered as text.
pub fn first_text(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    first_present(fields, candidates).map(render_text)
}

/// Render a field value the way it should appear in a notification.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_presence_rules() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(0.0)));
        assert!(!is_present(&json!("")));

        assert!(is_present(&json!(true)));
        assert!(is_present(&json!(7)));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!([])));
        assert!(is_present(&json!({})));
    }

    #[test]
    fn test_first_present_respects_order() {
        let doc = fields(json!({"toId": "bob", "recipientId": "alice"}));
        let value = first_present(&doc, &["recipientId", "toId"]);
        assert_eq!(value, Some(&json!("alice")));
    }

    #[test]
    fn test_first_present_skips_empty_values() {
        let doc = fields(json!({"text": "", "mensaje": null, "content": "hola"}));
        assert_eq!(
            first_text(&doc, &["text", "mensaje", "content"]).as_deref(),
            Some("hola")
        );
    }

    #[test]
    fn test_first_text_missing() {
        let doc = fields(json!({"other": "value"}));
        assert_eq!(first_text(&doc, &["text", "mensaje"]), None);
    }

    #[test]
    fn test_render_non_string_values() {
        assert_eq!(render_text(&json!(42)), "42");
        assert_eq!(render_text(&json!(true)), "true");
        assert_eq!(render_text(&json!({"a": 1})), "{\"a\":1}");
    }
}
