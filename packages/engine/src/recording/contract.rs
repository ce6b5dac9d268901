// packages/engine/src/recording/contract.rs
//! Recording contract
//!
//! A recording holds the captured data of one intercepted operation plus
//! metadata used for lookup. Mutation is only meaningful while the capture
//! is in progress: once closed, `set_data`/`add_metadata` are silent no-ops.
//!
//! Reads through [`Recording::get_data`] return an independent deep copy so
//! playback code can never corrupt stored data through aliasing.
//! [`Recording::get_data_direct`] hands out the stored value itself and is
//! meant for callers that already guarantee they won't mutate it.

use crate::utils::errors::Result;
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// Recording metadata (string keys, arbitrary JSON values)
pub type Metadata = serde_json::Map<String, Value>;

/// Structural clone over the recordable value domain
///
/// Values are JSON trees (scalars, arrays, string keyed objects) and so are
/// acyclic by construction.
pub fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(deep_copy).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), deep_copy(field)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// A capture of one interaction's inputs, outputs and metadata
pub trait Recording: fmt::Debug + Send + Sync {
    /// Unique, immutable recording id
    fn id(&self) -> &str;

    /// Whether the capture has ended
    fn is_closed(&self) -> bool;

    /// End the capture; the recording is read-only afterwards
    fn close(&mut self);

    /// Backend hook storing a value. Callers go through [`Recording::set_data`].
    fn store_data(&mut self, key: &str, value: Value);

    /// Backend hook merging metadata. Callers go through [`Recording::add_metadata`].
    fn store_metadata(&mut self, metadata: Metadata);

    /// The live stored value under `key`, without copying
    fn get_data_direct(&self, key: &str) -> Result<&Value>;

    /// Every key written before the recording was closed
    fn get_all_keys(&self) -> Vec<String>;

    /// Recorded metadata
    fn get_metadata(&self) -> &Metadata;

    /// Store `value` under `key`; ignored once closed
    fn set_data(&mut self, key: &str, value: Value) {
        if self.is_closed() {
            trace!("Ignoring write of key '{}' to closed recording {}", key, self.id());
            return;
        }
        self.store_data(key, value);
    }

    /// Merge `metadata` into the recording metadata; ignored once closed
    fn add_metadata(&mut self, metadata: Metadata) {
        if self.is_closed() {
            trace!("Ignoring metadata update of closed recording {}", self.id());
            return;
        }
        self.store_metadata(metadata);
    }

    /// An independently owned deep copy of the value under `key`
    ///
    /// Fails with [`PlaybackError::RecordingKey`](crate::utils::errors::PlaybackError::RecordingKey)
    /// when the key was never written.
    fn get_data(&self, key: &str) -> Result<Value> {
        self.get_data_direct(key).map(deep_copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_copy_is_structurally_equal() {
        let value = json!({"a": [1, {"b": "c"}], "d": null, "e": 1.5});
        let copy = deep_copy(&value);
        assert_eq!(copy, value);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let value = json!({"list": [1, 2, 3]});
        let mut copy = deep_copy(&value);
        copy["list"].as_array_mut().unwrap().push(json!(4));

        assert_eq!(value["list"].as_array().unwrap().len(), 3);
        assert_eq!(copy["list"].as_array().unwrap().len(), 4);
    }
}
