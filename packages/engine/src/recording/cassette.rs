// packages/engine/src/recording/cassette.rs
//! Storage port for recordings
//!
//! A tape cassette creates, persists and looks up recordings. Concrete
//! durable backends live outside this crate; [`InMemoryTapeCassette`] is the
//! reference implementation.
//!
//! [`InMemoryTapeCassette`]: crate::recording::in_memory_cassette::InMemoryTapeCassette

use crate::recording::contract::{Metadata, Recording};
use crate::recording::metadata_filter::MetadataFilter;
use crate::utils::errors::Result;
use chrono::{DateTime, Utc};

/// Lazily produced recording ids
pub type RecordingIdIter = Box<dyn Iterator<Item = String> + Send>;

/// Lazily produced recording metadata
pub type RecordingMetadataIter = Box<dyn Iterator<Item = Metadata> + Send>;

/// Search parameters for recording lookups
#[derive(Debug, Clone, Default)]
pub struct RecordingQuery {
    /// Earliest recording time (inclusive, UTC)
    pub start_date: Option<DateTime<Utc>>,

    /// Latest recording time (inclusive, UTC)
    pub end_date: Option<DateTime<Utc>>,

    /// Metadata every returned recording must match
    pub metadata: Option<MetadataFilter>,

    /// Maximum number of results
    pub limit: Option<usize>,

    /// Return results in random order (sampled before `limit` applies)
    pub random_results: bool,
}

impl RecordingQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataFilter) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_random_results(mut self, random_results: bool) -> Self {
        self.random_results = random_results;
        self
    }

    /// Whether `recorded_at` falls inside the date window
    pub fn in_date_window(&self, recorded_at: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| recorded_at >= start)
            && self.end_date.map_or(true, |end| recorded_at <= end)
    }
}

/// Storage driver for recordings
pub trait TapeCassette: Send + Sync {
    /// Start a new capture in `category`
    fn create_new_recording(&self, category: &str) -> Result<Box<dyn Recording>>;

    /// Backend specific persistence of a finished capture
    fn store_recording(&self, recording: &dyn Recording) -> Result<()>;

    /// Persist `recording` and close it
    fn save_recording(&self, recording: &mut dyn Recording) -> Result<()> {
        self.store_recording(recording)?;
        recording.close();
        Ok(())
    }

    /// Discard `recording` without persisting it
    fn abort_recording(&self, recording: &mut dyn Recording) {
        recording.close();
    }

    /// Fetch a stored recording, failing with `NoSuchRecording` if absent
    fn get_recording(&self, recording_id: &str) -> Result<Box<dyn Recording>>;

    /// Fetch only the metadata of a stored recording
    fn get_recording_metadata(&self, recording_id: &str) -> Result<Metadata>;

    /// Ids of recordings in `category` matching `query`
    fn iter_recording_ids(&self, category: &str, query: &RecordingQuery) -> Result<RecordingIdIter>;

    /// Metadata of recordings in `category` matching `query`
    fn iter_recordings_metadata(
        &self,
        category: &str,
        query: &RecordingQuery,
    ) -> Result<RecordingMetadataIter>;

    /// Category a recording id belongs to
    fn extract_recording_category(&self, recording_id: &str) -> Result<String>;

    /// Release backend resources
    fn close(&self) -> Result<()> {
        Ok(())
    }
}
