//! Dynamic ActivityPub object access.
//!
//! Inbound AP JSON-LD has polymorphic shape: `to`, `cc`, `tag` and `object`
//! may each arrive as a scalar or a list, as a string or an embedded object,
//! depending on the sending implementation. Rather than forcing a rigid
//! schema, [`RawApObj`] wraps the parsed tree and offers typed accessors
//! that normalize scalar↔singleton-list on the way out.

use ccbridge_common::{AppError, AppResult};
use serde_json::Value;

/// A dynamically-typed AP object.
#[derive(Debug, Clone)]
pub struct RawApObj {
    data: Value,
}

impl RawApObj {
    /// Parse raw bytes; the top level must be a JSON object.
    pub fn from_slice(bytes: &[u8]) -> AppResult<Self> {
        let data: Value = serde_json::from_slice(bytes)?;
        if !data.is_object() {
            return Err(AppError::BadRequest("expected a JSON object".to_string()));
        }
        Ok(Self { data })
    }

    /// Wrap an already-parsed value.
    #[must_use]
    pub const fn from_value(data: Value) -> Self {
        Self { data }
    }

    /// The underlying tree.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Walk a dotted path (`icon.url`) through nested objects.
    fn get(&self, path: &str) -> Option<&Value> {
        let mut value = &self.data;
        for key in path.split('.') {
            value = value.as_object()?.get(key)?;
        }
        Some(value)
    }

    /// String at `path`; a string list yields its first element.
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(|v| v.as_str().map(str::to_string)),
            _ => None,
        }
    }

    /// String at `path`, empty when absent.
    #[must_use]
    pub fn must_str(&self, path: &str) -> String {
        self.get_str(path).unwrap_or_default()
    }

    /// Bool at `path`, false when absent.
    #[must_use]
    pub fn must_bool(&self, path: &str) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Object at `path`; an object list yields its first element.
    #[must_use]
    pub fn get_obj(&self, path: &str) -> Option<Self> {
        match self.get(path)? {
            value @ Value::Object(_) => Some(Self::from_value(value.clone())),
            Value::Array(items) => items
                .iter()
                .find(|v| v.is_object())
                .map(|v| Self::from_value(v.clone())),
            _ => None,
        }
    }

    /// Object list at `path`; a single object yields a singleton list.
    #[must_use]
    pub fn get_obj_list(&self, path: &str) -> Vec<Self> {
        match self.get(path) {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| v.is_object())
                .map(|v| Self::from_value(v.clone()))
                .collect(),
            Some(v @ Value::Object(_)) => vec![Self::from_value(v.clone())],
            _ => Vec::new(),
        }
    }

    /// String list at `path`; a single string yields a singleton list.
    #[must_use]
    pub fn get_str_list(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> RawApObj {
        RawApObj::from_value(v)
    }

    #[test]
    fn test_dotted_path() {
        let o = obj(json!({"icon": {"url": "https://r/p.png"}}));
        assert_eq!(o.must_str("icon.url"), "https://r/p.png");
        assert_eq!(o.must_str("icon.missing"), "");
        assert_eq!(o.must_str("missing.url"), "");
    }

    #[test]
    fn test_str_normalizes_singleton_list() {
        let o = obj(json!({"to": ["https://a", "https://b"], "cc": "https://c"}));
        assert_eq!(o.get_str("to").unwrap(), "https://a");
        assert_eq!(o.get_str_list("to"), vec!["https://a", "https://b"]);
        assert_eq!(o.get_str_list("cc"), vec!["https://c"]);
        assert!(o.get_str_list("bcc").is_empty());
    }

    #[test]
    fn test_obj_normalizes_scalar_and_list() {
        let single = obj(json!({"tag": {"type": "Emoji", "name": ":party:"}}));
        assert_eq!(single.get_obj("tag").unwrap().must_str("name"), ":party:");
        assert_eq!(single.get_obj_list("tag").len(), 1);

        let many = obj(json!({"tag": [
            {"type": "Emoji", "name": ":a:"},
            {"type": "Mention", "href": "https://r/u"}
        ]}));
        assert_eq!(many.get_obj("tag").unwrap().must_str("name"), ":a:");
        assert_eq!(many.get_obj_list("tag").len(), 2);

        let none = obj(json!({"tag": null}));
        assert!(none.get_obj("tag").is_none());
    }

    #[test]
    fn test_bool() {
        let o = obj(json!({"sensitive": true}));
        assert!(o.must_bool("sensitive"));
        assert!(!o.must_bool("missing"));
    }

    #[test]
    fn test_from_slice_rejects_non_object() {
        assert!(RawApObj::from_slice(b"[1,2]").is_err());
        assert!(RawApObj::from_slice(b"not json").is_err());
        assert!(RawApObj::from_slice(b"{\"type\":\"Follow\"}").is_ok());
    }
}
