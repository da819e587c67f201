use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Reserved field holding the record identity. Always equals the key the record is stored under.
pub const DATA_ID_FIELD: &str = "__dataID__";
/// Reserved field holding the record's type name. Optional.
pub const TYPENAME_FIELD: &str = "__typename";
/// The namespace key used by the host bindings when the caller doesn't provide one.
pub const DEFAULT_STORAGE_KEY: &str = "__RelayCacheManager__";

/// A normalized entity: an open mapping of field names to JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new<S: Into<String>>(data_id: S) -> Self {
        let mut fields = Map::new();
        fields.insert(DATA_ID_FIELD.to_string(), Value::String(data_id.into()));
        Self(fields)
    }

    /// Same as [`Record::new`], plus `__typename` when one is given. A missing type name leaves the field out
    /// entirely rather than storing a `null`.
    pub fn with_typename<S: Into<String>>(data_id: S, typename: Option<&str>) -> Self {
        let mut record = Self::new(data_id);
        if let Some(typename) = typename {
            record.set(TYPENAME_FIELD, Value::String(typename.to_string()));
        }
        record
    }

    pub fn data_id(&self) -> Option<&str> {
        self.0.get(DATA_ID_FIELD).and_then(Value::as_str)
    }

    pub fn typename(&self) -> Option<&str> {
        self.0.get(TYPENAME_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Overwrites the field, returning what was there before. Nested values are never merged.
    pub fn set<S: Into<String>>(&mut self, field: S, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn stamp_identity(&mut self, data_id: &str) {
        if self.data_id() != Some(data_id) {
            self.0
                .insert(DATA_ID_FIELD.to_string(), Value::String(data_id.to_string()));
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Which mutations write the snapshot back to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PersistPolicy {
    /// Field writes, node writes and root call writes all persist.
    #[default]
    EveryMutation,
    /// Only field writes persist. Node and root call writes stay in memory until the next field write.
    FieldWrites,
    /// Nothing persists implicitly; see [`CacheWriter::persist`](crate::CacheWriter::persist).
    Manual,
}

impl PersistPolicy {
    pub(crate) fn persists_fields(self) -> bool {
        !matches!(self, PersistPolicy::Manual)
    }

    pub(crate) fn persists_nodes(self) -> bool {
        matches!(self, PersistPolicy::EveryMutation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn typename_is_left_out_when_absent() {
        let record = Record::with_typename("1", None);
        assert_eq!(record.data_id(), Some("1"));
        assert_eq!(record.typename(), None);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"__dataID__": "1"}));
    }

    #[test]
    fn set_overwrites_without_merging() {
        let mut record = Record::new("1");
        record.set("address", json!({"city": "Oslo", "zip": "0150"}));
        let old = record.set("address", json!({"city": "Bergen"}));
        assert_eq!(old, Some(json!({"city": "Oslo", "zip": "0150"})));
        assert_eq!(record.get("address"), Some(&json!({"city": "Bergen"})));
    }

    #[test]
    fn stamping_replaces_foreign_identity() {
        let mut record = Record::from(json!({"__dataID__": "2", "name": "Bob"}).as_object().unwrap().clone());
        record.stamp_identity("1");
        assert_eq!(record.data_id(), Some("1"));
        assert_eq!(record.get("name"), Some(&json!("Bob")));
    }
}
