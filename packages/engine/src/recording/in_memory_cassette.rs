// packages/engine/src/recording/in_memory_cassette.rs
//! Tape cassette keeping every recording in memory
//!
//! Reference implementation of the storage port, used by tests and local
//! experiments. Nothing survives the process.
//!
//! Recording ids have the form `{category}/{ulid}`, which lets the category be
//! derived from the id alone.

use crate::recorder::RECORDED_AT;
use crate::recording::cassette::{
    RecordingIdIter, RecordingMetadataIter, RecordingQuery, TapeCassette,
};
use crate::recording::compressor::{CompressionLevel, Compressor};
use crate::recording::contract::{Metadata, Recording};
use crate::recording::memory::MemoryRecording;
use crate::utils::errors::{PlaybackError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use tracing::debug;

/// A saved recording in its persisted form
#[derive(Debug)]
struct StoredRecording {
    category: String,
    recorded_at: DateTime<Utc>,
    metadata: Metadata,
    payload: Vec<u8>,
}

/// In-memory storage backend
pub struct InMemoryTapeCassette {
    recordings: DashMap<String, StoredRecording>,

    /// Save order, used for deterministic iteration
    order: RwLock<Vec<String>>,

    last_id: RwLock<Option<String>>,
    compressor: Compressor,
}

impl InMemoryTapeCassette {
    pub fn new() -> Self {
        Self::with_compression(CompressionLevel::Fast)
    }

    pub fn with_compression(level: CompressionLevel) -> Self {
        Self {
            recordings: DashMap::new(),
            order: RwLock::new(Vec::new()),
            last_id: RwLock::new(None),
            compressor: Compressor::new(level),
        }
    }

    /// Id of the most recently saved recording
    pub fn get_last_recording_id(&self) -> Option<String> {
        self.last_id.read().clone()
    }

    /// Number of saved recordings
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    fn category_of(recording_id: &str) -> Option<&str> {
        recording_id
            .rsplit_once('/')
            .map(|(category, _)| category)
            .filter(|category| !category.is_empty())
    }

    fn recorded_at(metadata: &Metadata) -> DateTime<Utc> {
        metadata
            .get(RECORDED_AT)
            .and_then(|value| value.as_str())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }

    /// Ids in save order that match `query`, before limit/shuffle
    fn matching_ids(&self, category: &str, query: &RecordingQuery) -> Vec<String> {
        let order = self.order.read();
        order
            .iter()
            .filter(|id| {
                self.recordings.get(id.as_str()).map_or(false, |stored| {
                    stored.category == category
                        && query.in_date_window(stored.recorded_at)
                        && query
                            .metadata
                            .as_ref()
                            .map_or(true, |filter| filter.matches(&stored.metadata))
                })
            })
            .cloned()
            .collect()
    }

    fn select(&self, category: &str, query: &RecordingQuery) -> Vec<String> {
        let mut ids = self.matching_ids(category, query);

        if query.random_results {
            ids.shuffle(&mut rand::thread_rng());
        }

        if let Some(limit) = query.limit {
            ids.truncate(limit);
        }

        debug!(
            "Lookup of category {} matched {} recordings",
            category,
            ids.len()
        );
        ids
    }
}

impl Default for InMemoryTapeCassette {
    fn default() -> Self {
        Self::new()
    }
}

impl TapeCassette for InMemoryTapeCassette {
    fn create_new_recording(&self, category: &str) -> Result<Box<dyn Recording>> {
        let id = format!("{}/{}", category, ulid::Ulid::new());
        Ok(Box::new(MemoryRecording::with_id(id)))
    }

    fn store_recording(&self, recording: &dyn Recording) -> Result<()> {
        let id = recording.id().to_string();
        let category = Self::category_of(&id)
            .ok_or_else(|| {
                PlaybackError::Storage(format!(
                    "Recording id {} was not created by this cassette",
                    id
                ))
            })?
            .to_string();

        let payload = self.compressor.encode_recording(recording)?;
        let metadata = recording.get_metadata().clone();
        let stored = StoredRecording {
            category,
            recorded_at: Self::recorded_at(&metadata),
            metadata,
            payload,
        };

        debug!("Saving recording {} ({} bytes)", id, stored.payload.len());

        if self.recordings.insert(id.clone(), stored).is_none() {
            self.order.write().push(id.clone());
        }
        *self.last_id.write() = Some(id);
        Ok(())
    }

    fn get_recording(&self, recording_id: &str) -> Result<Box<dyn Recording>> {
        let stored = self
            .recordings
            .get(recording_id)
            .ok_or_else(|| PlaybackError::NoSuchRecording(recording_id.to_string()))?;

        let mut recording = self.compressor.decode_recording(&stored.payload)?;
        recording.close();
        Ok(Box::new(recording))
    }

    fn get_recording_metadata(&self, recording_id: &str) -> Result<Metadata> {
        self.recordings
            .get(recording_id)
            .map(|stored| stored.metadata.clone())
            .ok_or_else(|| PlaybackError::NoSuchRecording(recording_id.to_string()))
    }

    fn iter_recording_ids(&self, category: &str, query: &RecordingQuery) -> Result<RecordingIdIter> {
        Ok(Box::new(self.select(category, query).into_iter()))
    }

    fn iter_recordings_metadata(
        &self,
        category: &str,
        query: &RecordingQuery,
    ) -> Result<RecordingMetadataIter> {
        let metadata: Vec<Metadata> = self
            .select(category, query)
            .iter()
            .filter_map(|id| self.recordings.get(id).map(|stored| stored.metadata.clone()))
            .collect();
        Ok(Box::new(metadata.into_iter()))
    }

    fn extract_recording_category(&self, recording_id: &str) -> Result<String> {
        Self::category_of(recording_id)
            .map(str::to_string)
            .ok_or_else(|| PlaybackError::NoSuchRecording(recording_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::INCOMPLETE_RECORDING;
    use crate::recording::metadata_filter::{MetadataFilter, MetadataMatcher};
    use chrono::Duration;
    use serde_json::{json, Value};

    fn metadata(value: Value) -> Metadata {
        value.as_object().cloned().unwrap()
    }

    fn save(cassette: &InMemoryTapeCassette, category: &str, meta: Value) -> String {
        let mut recording = cassette.create_new_recording(category).unwrap();
        recording.set_data("input", json!(1));
        recording.add_metadata(metadata(meta));
        cassette.save_recording(recording.as_mut()).unwrap();
        assert!(recording.is_closed());
        recording.id().to_string()
    }

    #[test]
    fn test_save_and_fetch() {
        let cassette = InMemoryTapeCassette::new();
        let id = save(&cassette, "checkout", json!({"user": "alice"}));

        let fetched = cassette.get_recording(&id).unwrap();
        assert_eq!(fetched.id(), id);
        assert_eq!(fetched.get_data("input").unwrap(), json!(1));
        assert!(fetched.is_closed());
        assert_eq!(cassette.get_last_recording_id(), Some(id.clone()));
        assert_eq!(
            cassette.get_recording_metadata(&id).unwrap()["user"],
            json!("alice")
        );
    }

    #[test]
    fn test_missing_recording() {
        let cassette = InMemoryTapeCassette::new();
        let result = cassette.get_recording("checkout/nope");
        assert!(matches!(result, Err(PlaybackError::NoSuchRecording(id)) if id == "checkout/nope"));
        assert!(cassette.get_recording_metadata("checkout/nope").is_err());
    }

    #[test]
    fn test_abort_does_not_persist() {
        let cassette = InMemoryTapeCassette::new();
        let mut recording = cassette.create_new_recording("checkout").unwrap();
        cassette.abort_recording(recording.as_mut());

        assert!(recording.is_closed());
        assert!(cassette.is_empty());
    }

    #[test]
    fn test_extract_category() {
        let cassette = InMemoryTapeCassette::new();
        let id = save(&cassette, "billing/invoices", json!({}));
        assert_eq!(
            cassette.extract_recording_category(&id).unwrap(),
            "billing/invoices"
        );
        assert!(cassette.extract_recording_category("no-category").is_err());
    }

    #[test]
    fn test_iter_by_category_in_save_order() {
        let cassette = InMemoryTapeCassette::new();
        let a = save(&cassette, "checkout", json!({}));
        let _ = save(&cassette, "search", json!({}));
        let b = save(&cassette, "checkout", json!({}));

        let ids: Vec<String> = cassette
            .iter_recording_ids("checkout", &RecordingQuery::new())
            .unwrap()
            .collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_iter_with_limit_and_random() {
        let cassette = InMemoryTapeCassette::new();
        for _ in 0..10 {
            save(&cassette, "checkout", json!({}));
        }

        let query = RecordingQuery::new().with_limit(3).with_random_results(true);
        let ids: Vec<String> = cassette.iter_recording_ids("checkout", &query).unwrap().collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_iter_with_metadata_filter() {
        let cassette = InMemoryTapeCassette::new();
        let complete = save(&cassette, "checkout", json!({INCOMPLETE_RECORDING: false}));
        let legacy = save(&cassette, "checkout", json!({}));
        let _incomplete = save(&cassette, "checkout", json!({INCOMPLETE_RECORDING: true}));

        let filter = MetadataFilter::new().with(
            INCOMPLETE_RECORDING,
            MetadataMatcher::OneOf(vec![json!(false), Value::Null]),
        );
        let query = RecordingQuery::new().with_metadata(filter);
        let ids: Vec<String> = cassette.iter_recording_ids("checkout", &query).unwrap().collect();
        assert_eq!(ids, vec![complete, legacy]);

        let metadata: Vec<Metadata> = cassette
            .iter_recordings_metadata("checkout", &query)
            .unwrap()
            .collect();
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_iter_with_date_window() {
        let cassette = InMemoryTapeCassette::new();
        let now = Utc::now();
        let old = (now - Duration::days(30)).to_rfc3339();
        let recent = (now - Duration::hours(1)).to_rfc3339();

        let _old_id = save(&cassette, "checkout", json!({RECORDED_AT: old}));
        let recent_id = save(&cassette, "checkout", json!({RECORDED_AT: recent}));

        let query = RecordingQuery::new()
            .with_start_date(now - Duration::days(7))
            .with_end_date(now + Duration::hours(1));
        let ids: Vec<String> = cassette.iter_recording_ids("checkout", &query).unwrap().collect();
        assert_eq!(ids, vec![recent_id]);
    }

    #[test]
    fn test_store_rejects_foreign_ids() {
        let cassette = InMemoryTapeCassette::new();
        let mut recording = MemoryRecording::with_id("plain-id");
        let result = cassette.save_recording(&mut recording);
        assert!(matches!(result, Err(PlaybackError::Storage(_))));
    }
}
