use crate::error::{CyreneError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values sent when creating or updating an entry, in insertion order.
pub type Payload = IndexMap<String, Value>;

/// A single entity returned by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    /// The `_id` field, if present and not null
    pub fn id_value(&self) -> Option<&Value> {
        self.0.get("_id").filter(|id| !id.is_null())
    }

    /// The `_id` field rendered as a string
    pub fn id(&self) -> Option<String> {
        match self.id_value()? {
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Get a value by a slash-separated path.
    /// For example, "address/city" reads the "city" field of the "address" object.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut current = self.0.get(parts.next()?)?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }

        Some(current)
    }

    /// Get a string value by a slash-separated path
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path).and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Deserialize the entry into a caller-defined type
    pub fn apply<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(CyreneError::from)
    }

    /// Borrow the raw field map
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(map: Map<String, Value>) -> Self {
        Entry(map)
    }
}

/// Body of a protected GET: `{ "success": bool, "data": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(default)]
    pub data: Option<Vec<Entry>>,
}

impl Envelope {
    /// Parse an envelope from a response body
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| CyreneError::MalformedResponse(e.to_string()))
    }

    /// Entities count only when the call succeeded and the first one carries an `_id`
    pub fn into_lookup(self) -> Lookup {
        match self.data {
            Some(data) if self.success && data.first().and_then(Entry::id_value).is_some() => {
                Lookup::Found(data)
            }
            _ => Lookup::Empty,
        }
    }
}

/// Outcome of a protected GET that reached the server and was understood.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// At least one entity
    Found(Vec<Entry>),
    /// The server answered, but with nothing matching
    Empty,
}

impl Lookup {
    pub fn is_empty(&self) -> bool {
        matches!(self, Lookup::Empty)
    }

    /// First entity, if any
    pub fn first(self) -> Option<Entry> {
        self.into_entries().into_iter().next()
    }

    /// All entities, empty for [`Lookup::Empty`]
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            Lookup::Found(entries) => entries,
            Lookup::Empty => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_found() {
        let envelope = Envelope::parse(r#"{"success": true, "data": [{"_id": "1", "name": "x"}]}"#)
            .unwrap();

        let entry = envelope.into_lookup().first().unwrap();
        assert_eq!(entry.id(), Some("1".to_string()));
        assert_eq!(entry.get_string("name"), Some("x".to_string()));
    }

    #[test]
    fn test_envelope_empty_outcomes() {
        for body in [
            r#"{"success": false, "data": []}"#,
            r#"{"success": true, "data": []}"#,
            r#"{"success": true}"#,
            r#"{"success": true, "data": null}"#,
            r#"{"success": false, "data": [{"_id": "1"}]}"#,
            r#"{"success": true, "data": [{"_id": null, "name": "x"}]}"#,
            r#"{"success": true, "data": [{"name": "x"}]}"#,
        ] {
            let lookup = Envelope::parse(body).unwrap().into_lookup();
            assert!(lookup.is_empty(), "{}", body);
        }
    }

    #[test]
    fn test_envelope_malformed() {
        for body in ["", "not json", "[]", r#"{"data": []}"#, r#"{"success": true, "data": [1]}"#] {
            let err = Envelope::parse(body).unwrap_err();
            assert!(err.is_malformed(), "{}", body);
        }
    }

    #[test]
    fn test_numeric_id() {
        let entry: Entry = serde_json::from_str(r#"{"_id": 42}"#).unwrap();
        assert_eq!(entry.id(), Some("42".to_string()));
    }

    #[test]
    fn test_entry_path_access() {
        let entry: Entry = serde_json::from_str(
            r#"{"_id": "1", "address": {"city": "Lyon"}, "tags": ["a", "b"]}"#,
        )
        .unwrap();

        assert_eq!(entry.get_string("address/city"), Some("Lyon".to_string()));
        assert_eq!(entry.get_string("tags/1"), Some("b".to_string()));
        assert!(entry.get("address/zip").is_none());
        assert!(entry.get("").is_none());
    }

    #[test]
    fn test_entry_apply() {
        #[derive(Deserialize)]
        struct Contact {
            #[serde(rename = "_id")]
            id: String,
            name: String,
        }

        let entry: Entry = serde_json::from_str(r#"{"_id": "7", "name": "Ada"}"#).unwrap();
        let contact: Contact = entry.apply().unwrap();
        assert_eq!(contact.id, "7");
        assert_eq!(contact.name, "Ada");
    }

    #[test]
    fn test_payload_keeps_insertion_order() {
        let mut payload = Payload::new();
        payload.insert("zeta".to_string(), Value::from(1));
        payload.insert("alpha".to_string(), Value::from("two"));

        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"two"}"#);
    }
}
