// packages/engine/src/studio/lookup.rs
//! Recording lookup window

use crate::recorder::{TapeRecorder, INCOMPLETE_RECORDING};
use crate::recording::cassette::{RecordingIdIter, RecordingQuery};
use crate::recording::metadata_filter::{MetadataFilter, MetadataMatcher};
use crate::utils::config::PlaybackConfig;
use crate::utils::errors::Result;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Which recordings of a category to compare
#[derive(Debug, Clone)]
pub struct RecordingLookupProperties {
    /// Earliest recording time
    pub start_date: DateTime<Utc>,

    /// Latest recording time
    pub end_date: Option<DateTime<Utc>>,

    pub metadata: Option<MetadataFilter>,
    pub limit: Option<usize>,

    /// Sample randomly instead of taking the first matches
    pub random_sample: bool,

    /// Exclude recordings flagged as incomplete
    pub skip_incomplete: bool,
}

impl RecordingLookupProperties {
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date: None,
            metadata: None,
            limit: None,
            random_sample: false,
            skip_incomplete: true,
        }
    }

    /// Window covering the last `days_back` days
    pub fn default_window(days_back: i64, limit: Option<usize>) -> Self {
        let mut properties = Self::new(Utc::now() - Duration::days(days_back));
        properties.limit = limit;
        properties
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::default_window(config.lookup.days_back, config.lookup.limit)
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

    pub fn with_random_sample(mut self, random_sample: bool) -> Self {
        self.random_sample = random_sample;
        self
    }

    pub fn with_skip_incomplete(mut self, skip_incomplete: bool) -> Self {
        self.skip_incomplete = skip_incomplete;
        self
    }

    /// Storage query equivalent to these properties
    pub fn to_query(&self) -> RecordingQuery {
        let mut metadata = self.metadata.clone();
        if self.skip_incomplete {
            // null keeps recordings made before the flag existed
            metadata.get_or_insert_with(MetadataFilter::new).insert(
                INCOMPLETE_RECORDING,
                MetadataMatcher::OneOf(vec![Value::Bool(false), Value::Null]),
            );
        }

        RecordingQuery {
            start_date: Some(self.start_date),
            end_date: self.end_date,
            metadata,
            limit: self.limit,
            random_results: self.random_sample,
        }
    }
}

impl Default for RecordingLookupProperties {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

/// Ids of the recordings of `category` matching `lookup_properties`
pub fn find_matching_recording_ids(
    tape_recorder: &dyn TapeRecorder,
    category: &str,
    lookup_properties: &RecordingLookupProperties,
) -> Result<RecordingIdIter> {
    tape_recorder
        .cassette()
        .iter_recording_ids(category, &lookup_properties.to_query())
}
