// packages/engine/src/recording/memory.rs
//! In-memory recording
//!
//! Plain key/value store plus metadata. Storage backends build these when a
//! capture starts and rebuild them from their persisted form on fetch.

use crate::recording::contract::{Metadata, Recording};
use crate::utils::errors::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recording kept entirely in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecording {
    /// Recording id
    pub id: String,

    /// Captured data
    #[serde(default)]
    pub recording_data: serde_json::Map<String, Value>,

    /// Captured metadata
    #[serde(default)]
    pub recording_metadata: Metadata,

    #[serde(skip)]
    closed: bool,
}

impl MemoryRecording {
    /// Create an empty recording with a freshly generated id
    pub fn new() -> Self {
        Self::with_id(ulid::Ulid::new().to_string())
    }

    /// Create an empty recording with the given id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::from_parts(id, serde_json::Map::new(), Metadata::new())
    }

    /// Rebuild a recording from previously captured data
    pub fn from_parts(
        id: impl Into<String>,
        recording_data: serde_json::Map<String, Value>,
        recording_metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            recording_data,
            recording_metadata,
            closed: false,
        }
    }

    /// Snapshot any recording into a `MemoryRecording`
    pub fn snapshot(recording: &dyn Recording) -> Result<Self> {
        let mut data = serde_json::Map::new();
        for key in recording.get_all_keys() {
            data.insert(key.clone(), recording.get_data(&key)?);
        }
        Ok(Self::from_parts(
            recording.id(),
            data,
            recording.get_metadata().clone(),
        ))
    }
}

impl Default for MemoryRecording {
    fn default() -> Self {
        Self::new()
    }
}

impl Recording for MemoryRecording {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn store_data(&mut self, key: &str, value: Value) {
        self.recording_data.insert(key.to_string(), value);
    }

    fn store_metadata(&mut self, metadata: Metadata) {
        self.recording_metadata.extend(metadata);
    }

    fn get_data_direct(&self, key: &str) -> Result<&Value> {
        self.recording_data
            .get(key)
            .ok_or_else(|| PlaybackError::RecordingKey(key.to_string()))
    }

    fn get_all_keys(&self) -> Vec<String> {
        self.recording_data.keys().cloned().collect()
    }

    fn get_metadata(&self) -> &Metadata {
        &self.recording_metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let first = MemoryRecording::new();
        let second = MemoryRecording::new();
        assert!(!first.id().is_empty());
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_set_and_get_data() {
        let mut recording = MemoryRecording::with_id("rec-1");
        recording.set_data("input", json!({"value": 3}));

        assert_eq!(recording.get_data("input").unwrap(), json!({"value": 3}));
        assert_eq!(recording.id(), "rec-1");
    }

    #[test]
    fn test_missing_key_fails() {
        let recording = MemoryRecording::new();
        let result = recording.get_data("missing");
        assert!(matches!(result, Err(PlaybackError::RecordingKey(key)) if key == "missing"));
        assert!(recording.get_data_direct("missing").is_err());
    }

    #[test]
    fn test_get_data_returns_independent_copy() {
        let mut recording = MemoryRecording::new();
        recording.set_data("list", json!([1, 2, 3]));

        let direct = recording.get_data_direct("list").unwrap();
        let mut copy = recording.get_data("list").unwrap();
        assert_eq!(&copy, direct);
        assert!(!std::ptr::eq(&copy, direct));

        copy.as_array_mut().unwrap().push(json!(4));
        assert_eq!(recording.get_data("list").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_two_reads_do_not_observe_each_other() {
        let mut recording = MemoryRecording::new();
        recording.set_data("obj", json!({"a": 1}));

        let mut first = recording.get_data("obj").unwrap();
        first["a"] = json!(100);
        let second = recording.get_data("obj").unwrap();
        assert_eq!(second, json!({"a": 1}));
    }

    #[test]
    fn test_writes_after_close_are_ignored() {
        let mut recording = MemoryRecording::new();
        recording.set_data("a", json!(1));
        recording.add_metadata(metadata(json!({"user": "x"})));
        recording.close();

        recording.set_data("a", json!(2));
        recording.set_data("b", json!(3));
        recording.add_metadata(metadata(json!({"user": "y", "extra": true})));

        assert!(recording.is_closed());
        assert_eq!(recording.get_data("a").unwrap(), json!(1));
        assert!(recording.get_data("b").is_err());
        assert_eq!(recording.get_metadata(), &metadata(json!({"user": "x"})));
    }

    #[test]
    fn test_get_all_keys_reflects_writes_before_close() {
        let mut recording = MemoryRecording::new();
        recording.set_data("a", json!(1));
        recording.set_data("b", json!(2));
        recording.set_data("a", json!(3));
        recording.close();
        recording.set_data("c", json!(4));

        let keys: BTreeSet<String> = recording.get_all_keys().into_iter().collect();
        assert_eq!(keys, BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_metadata_merges() {
        let mut recording = MemoryRecording::new();
        recording.add_metadata(metadata(json!({"a": 1, "b": 2})));
        recording.add_metadata(metadata(json!({"b": 3})));
        assert_eq!(recording.get_metadata(), &metadata(json!({"a": 1, "b": 3})));
    }

    #[test]
    fn test_serialization_skips_closed_flag() {
        let mut recording = MemoryRecording::with_id("rec");
        recording.set_data("k", json!("v"));
        recording.close();

        let encoded = serde_json::to_string(&recording).unwrap();
        let decoded: MemoryRecording = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id(), "rec");
        assert_eq!(decoded.get_data("k").unwrap(), json!("v"));
        assert!(!decoded.is_closed());
    }
}
