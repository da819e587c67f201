use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::CacheError;
use crate::error::Result;
use crate::types::Record;

/// In-memory home of normalized records and root call mappings.
///
/// The serialized form is an object with two properties, `records` (data id to record) and `rootCallMap` (storage
/// key to data id). There is no version marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordStore {
    records:       HashMap<String, Record>,
    #[serde(rename = "rootCallMap")]
    root_call_map: HashMap<String, String>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record at `data_id`. The stored record always carries `data_id` as its identity.
    pub fn write_record(&mut self, data_id: &str, mut record: Record) {
        record.stamp_identity(data_id);
        self.records.insert(data_id.to_string(), record);
    }

    pub fn read_node(&self, data_id: &str) -> Option<&Record> {
        self.records.get(data_id)
    }

    pub(crate) fn take_record(&mut self, data_id: &str) -> Option<Record> {
        self.records.remove(data_id)
    }

    /// Maps a root call storage key to a data id. The id doesn't have to be known to the store yet.
    pub fn write_root_call(&mut self, storage_key: &str, data_id: &str) {
        self.root_call_map
            .insert(storage_key.to_string(), data_id.to_string());
    }

    pub fn root_call(&self, storage_key: &str) -> Option<&str> {
        self.root_call_map.get(storage_key).map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn root_calls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.root_call_map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of records. Root calls don't count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.root_call_map.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a snapshot produced by [`RecordStore::to_json`]. Nothing is returned unless the whole snapshot is
    /// valid, so there is never a half-filled store.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(CacheError::EmptySnapshot);
        }

        let store: Self = serde_json::from_str(text)?;

        for (key, record) in &store.records {
            if record.data_id() != Some(key.as_str()) {
                return Err(CacheError::IdentityMismatch {
                    key:   key.clone(),
                    found: record.data_id().map(str::to_string),
                });
            }
        }

        Ok(store)
    }

    /// `Ok(None)` means there was no snapshot to begin with; an error means there was one but it can't be used.
    pub fn hydrate(text: Option<&str>) -> Result<Option<Self>> {
        match text {
            None => Ok(None),
            Some(text) => Self::from_json(text).map(Some),
        }
    }
}
