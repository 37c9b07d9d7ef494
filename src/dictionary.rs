//! Two-way raw ↔ display value mapping for one field

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Dictionary key as written in configuration (`0: inactive` or `"A": ...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictKey {
    Int(i64),
    Text(String),
}

impl DictKey {
    /// Canonical integer text ("1", "-3") becomes `Int`, everything else stays text.
    fn normalized(&self) -> DictKey {
        match self {
            DictKey::Text(s) => match s.parse::<i64>() {
                Ok(n) if n.to_string() == *s => DictKey::Int(n),
                _ => self.clone(),
            },
            DictKey::Int(_) => self.clone(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            DictKey::Int(n) => Value::from(*n),
            DictKey::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictKey::Int(n) => write!(f, "{}", n),
            DictKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DictKey {
    fn from(n: i64) -> Self {
        DictKey::Int(n)
    }
}

impl From<i32> for DictKey {
    fn from(n: i32) -> Self {
        DictKey::Int(n as i64)
    }
}

impl From<&str> for DictKey {
    fn from(s: &str) -> Self {
        DictKey::Text(s.to_string())
    }
}

impl From<String> for DictKey {
    fn from(s: String) -> Self {
        DictKey::Text(s)
    }
}

/// Lookup key text for a record value, mirroring loose scalar key matching:
/// numbers and numeric strings address the same entry.
pub fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some((f as i64).to_string())
            }
            _ => Some(n.to_string()),
        },
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Raw ↔ display mapping, built once per schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    /// key text → (raw value, display text), in configuration order
    forward: IndexMap<String, (Value, String)>,
    /// display text → raw value; later entries win on duplicate display text
    reverse: HashMap<String, Value>,
}

impl Dictionary {
    pub fn from_entries(entries: &IndexMap<DictKey, String>) -> Self {
        let mut forward = IndexMap::with_capacity(entries.len());
        let mut reverse = HashMap::with_capacity(entries.len());

        for (key, display) in entries {
            let key = key.normalized();
            let raw = key.to_value();
            reverse.insert(display.clone(), raw.clone());
            forward.insert(key.to_string(), (raw, display.clone()));
        }

        Self { forward, reverse }
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.forward.contains_key(key)
    }

    /// Display text for a raw record value, if the value is a dictionary key.
    pub fn display_for(&self, raw: &Value) -> Option<&str> {
        let key = value_key(raw)?;
        self.forward.get(&key).map(|(_, display)| display.as_str())
    }

    /// Resolve a formatted cell value read from a sheet.
    ///
    /// Values that are already keys pass through as text; display values map
    /// back to their raw key; anything else is kept unchanged.
    pub fn resolve_import(&self, formatted: &str) -> Value {
        if self.is_empty() || self.contains_key(formatted) {
            return Value::String(formatted.to_string());
        }
        self.reverse
            .get(formatted)
            .cloned()
            .unwrap_or_else(|| Value::String(formatted.to_string()))
    }

    /// (raw, display) pairs in configuration order.
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &str)> {
        self.forward
            .values()
            .map(|(raw, display)| (raw, display.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_dict() -> Dictionary {
        let mut entries = IndexMap::new();
        entries.insert(DictKey::Int(0), "inactive".to_string());
        entries.insert(DictKey::Text("1".to_string()), "active".to_string());
        Dictionary::from_entries(&entries)
    }

    #[test]
    fn test_display_for_numeric_and_string_keys() {
        let dict = status_dict();
        assert_eq!(dict.display_for(&json!(1)), Some("active"));
        assert_eq!(dict.display_for(&json!("1")), Some("active"));
        assert_eq!(dict.display_for(&json!(0)), Some("inactive"));
        assert_eq!(dict.display_for(&json!(1.0)), Some("active"));
        assert_eq!(dict.display_for(&json!(2)), None);
        assert_eq!(dict.display_for(&json!("")), None);
    }

    #[test]
    fn test_resolve_import_reverse_lookup() {
        let dict = status_dict();
        // display value maps back to the raw (numeric) key
        assert_eq!(dict.resolve_import("active"), json!(1));
        assert_eq!(dict.resolve_import("inactive"), json!(0));
        // raw keys pass through as text
        assert_eq!(dict.resolve_import("1"), json!("1"));
        // unknown values are kept
        assert_eq!(dict.resolve_import("pending"), json!("pending"));
    }

    #[test]
    fn test_empty_dictionary_passes_through() {
        let dict = Dictionary::default();
        assert!(dict.is_empty());
        assert_eq!(dict.resolve_import("active"), json!("active"));
        assert_eq!(dict.display_for(&json!(1)), None);
    }

    #[test]
    fn test_text_keys_stay_text() {
        let mut entries = IndexMap::new();
        entries.insert(DictKey::from("M"), "Male".to_string());
        entries.insert(DictKey::from("007"), "Agent".to_string());
        let dict = Dictionary::from_entries(&entries);
        assert_eq!(dict.resolve_import("Male"), json!("M"));
        // leading zeros are not canonical integers
        assert_eq!(dict.resolve_import("Agent"), json!("007"));
    }

    #[test]
    fn test_duplicate_display_last_wins() {
        let mut entries = IndexMap::new();
        entries.insert(DictKey::Int(1), "yes".to_string());
        entries.insert(DictKey::Int(2), "yes".to_string());
        let dict = Dictionary::from_entries(&entries);
        assert_eq!(dict.resolve_import("yes"), json!(2));
        assert_eq!(dict.len(), 2);
    }
}
