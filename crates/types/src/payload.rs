//! The caller-supplied data payload used to resolve template markers.
//!
//! A payload maps field names to either a scalar (rendered through its display
//! string) or an ordered list of [`LoopItem`]s backing a repeated section. The
//! split is explicit so that every consumer has to decide, at compile time, what
//! to do with loop data versus scalar data.
//!
//! Conversion from JSON is total. Shapes that have no natural place in the model
//! (nested objects at the top level, arrays inside a loop item) fall back to
//! their JSON text, and non-object elements of a list become empty loop items with a logged
//! warning.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a payload from external input.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Data payload must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl ScalarValue {
    /// The string substituted for a marker, or `None` for null values, which
    /// never replace a marker.
    pub fn display_string(&self) -> Option<String> {
        match self {
            ScalarValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<Value> for ScalarValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ScalarValue::Null,
            Value::Bool(b) => ScalarValue::Bool(b),
            Value::Number(n) => ScalarValue::Number(n),
            Value::String(s) => ScalarValue::Text(s),
            // Best-effort: structured values are carried as their JSON text.
            other @ (Value::Array(_) | Value::Object(_)) => ScalarValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Number(n.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        match Number::from_f64(n) {
            Some(num) => ScalarValue::Number(num),
            None => ScalarValue::Text(n.to_string()),
        }
    }
}

/// One element of a repeated section's backing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LoopItem {
    fields: BTreeMap<String, ScalarValue>,
}

impl LoopItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> Option<ScalarValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ScalarValue> {
        self.fields.get(key)
    }

    /// Fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ScalarValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for LoopItem {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, ScalarValue::from(v))).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ScalarValue>> FromIterator<(K, V)> for LoopItem {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A payload value: either a scalar or the list backing a loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataValue {
    Scalar(ScalarValue),
    List(Vec<LoopItem>),
}

impl DataValue {
    pub fn as_list(&self) -> Option<&[LoopItem]> {
        match self {
            DataValue::List(items) => Some(items),
            DataValue::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            DataValue::Scalar(s) => Some(s),
            DataValue::List(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, DataValue::List(_))
    }

    /// Best-effort string form used where a list has to be written as text
    /// (for example into a form field). Scalars follow [`ScalarValue::display_string`].
    pub fn display_string(&self) -> Option<String> {
        match self {
            DataValue::Scalar(s) => s.display_string(),
            DataValue::List(_) => serde_json::to_string(self).ok(),
        }
    }
}

impl From<Value> for DataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(elements) => DataValue::List(
                elements
                    .into_iter()
                    .enumerate()
                    .map(|(index, element)| match element {
                        Value::Object(map) => LoopItem::from(map),
                        other => {
                            warn!(
                                "List element {} is {}, not an object; its loop fields will stay unresolved.",
                                index,
                                json_type_name(&other)
                            );
                            LoopItem::default()
                        }
                    })
                    .collect(),
            ),
            other => DataValue::Scalar(other.into()),
        }
    }
}

impl From<ScalarValue> for DataValue {
    fn from(value: ScalarValue) -> Self {
        DataValue::Scalar(value)
    }
}

impl From<Vec<LoopItem>> for DataValue {
    fn from(items: Vec<LoopItem>) -> Self {
        DataValue::List(items)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Scalar(s.into())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Scalar(s.into())
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Scalar(b.into())
    }
}

impl From<i64> for DataValue {
    fn from(n: i64) -> Self {
        DataValue::Scalar(n.into())
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        DataValue::Scalar(n.into())
    }
}

/// Mapping from field name to value, supplied fresh for every generation call.
///
/// Keys are kept in sorted order so that every pass over the payload, and
/// therefore every render, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataPayload {
    entries: BTreeMap<String, DataValue>,
}

impl DataPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a JSON document into a payload. The top level must be an object.
    pub fn from_json(value: Value) -> Result<Self, PayloadError> {
        match value {
            Value::Object(map) => Ok(Self {
                entries: map.into_iter().map(|(k, v)| (k, DataValue::from(v))).collect(),
            }),
            other => Err(PayloadError::NotAnObject(json_type_name(&other))),
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_json(value)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Option<DataValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, DataValue> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries whose value is not a list, in key order.
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_scalar().map(|s| (k.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for DataPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DataPayload::from_json(value).map_err(serde::de::Error::custom)
    }
}

impl<K: Into<String>, V: Into<DataValue>> FromIterator<(K, V)> for DataPayload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_splits_scalars_and_lists() {
        let payload = DataPayload::from_json(json!({
            "name": "Ann",
            "age": 42,
            "active": true,
            "items": [{ "sku": "A-1", "qty": 2 }, { "sku": "B-2", "qty": 1 }]
        }))
        .unwrap();

        assert_eq!(payload.len(), 4);
        assert_eq!(payload.get("name"), Some(&DataValue::from("Ann")));
        let items = payload.get("items").and_then(DataValue::as_list).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("sku"), Some(&ScalarValue::from("A-1")));
        assert_eq!(items[1].get("qty").and_then(ScalarValue::display_string).as_deref(), Some("1"));

        let scalar_keys: Vec<&str> = payload.scalars().map(|(k, _)| k).collect();
        assert_eq!(scalar_keys, vec!["active", "age", "name"]);
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = DataPayload::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, PayloadError::NotAnObject("an array")));
        assert!(DataPayload::from_json_str("not json").is_err());
    }

    #[test]
    fn test_nested_shapes_fall_back_to_json_text() {
        let payload = DataPayload::from_json(json!({
            "customer": { "city": "Oslo" },
            "rows": [{ "tags": ["a", "b"] }, 7]
        }))
        .unwrap();

        assert_eq!(
            payload.get("customer").and_then(DataValue::display_string).as_deref(),
            Some(r#"{"city":"Oslo"}"#)
        );
        let rows = payload.get("rows").and_then(DataValue::as_list).unwrap();
        assert_eq!(rows[0].get("tags"), Some(&ScalarValue::Text(r#"["a","b"]"#.into())));
        assert!(rows[1].is_empty());
    }

    #[test]
    fn test_list_of_plain_values_keeps_one_item_per_element() {
        let payload = DataPayload::from_json(json!({ "tags": ["a", "b", { "tagsName": "c" }] })).unwrap();

        let tags = payload.get("tags").and_then(DataValue::as_list).unwrap();
        assert_eq!(tags.len(), 3);
        assert!(tags[0].is_empty());
        assert!(tags[1].is_empty());
        assert_eq!(tags[2].get("tagsName"), Some(&ScalarValue::Text("c".into())));
    }

    #[test]
    fn test_null_has_no_display_string() {
        assert_eq!(ScalarValue::Null.display_string(), None);
        assert_eq!(ScalarValue::from(false).display_string().as_deref(), Some("false"));
        assert_eq!(ScalarValue::from(2.5).display_string().as_deref(), Some("2.5"));
    }

    #[test]
    fn test_deserialize_and_serialize_round_trip_shape() {
        let payload: DataPayload =
            serde_json::from_str(r#"{"title":"Report","lines":[{"id":1}]}"#).unwrap();
        assert_eq!(payload.to_json(), json!({ "lines": [{ "id": 1 }], "title": "Report" }));
    }

    #[test]
    fn test_builder_helpers() {
        let payload = DataPayload::new()
            .with("name", "Ann")
            .with("lines", vec![LoopItem::new().with("linesPrice", 9.5)]);
        assert!(payload.contains_key("lines"));
        assert!(payload.get("lines").unwrap().is_list());
        assert!(!payload.get("name").unwrap().is_list());
    }
}
