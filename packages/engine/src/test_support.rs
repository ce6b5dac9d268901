// packages/engine/src/test_support.rs
//! Test doubles shared by unit tests

use crate::interception::output_interception_key;
use crate::recorder::{
    extract_recorded_outputs, Output, Playback, PlaybackFunction, TapeRecorder, DURATION,
    RECORDED_AT,
};
use crate::recording::{InMemoryTapeCassette, Metadata, Recording, TapeCassette};
use crate::utils::errors::Result;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Recorder over an in-memory cassette
///
/// Recordings hold an `input` value and a single operation output. Replays
/// produce whatever the playback function returns as that output.
pub struct FakeTapeRecorder {
    cassette: Arc<InMemoryTapeCassette>,
}

impl FakeTapeRecorder {
    pub fn new() -> Self {
        Self {
            cassette: Arc::new(InMemoryTapeCassette::new()),
        }
    }

    /// Save a finished recording and return its id
    pub fn record(&self, category: &str, input: Value, output: Value, metadata: Value) -> String {
        let mut recording = self.cassette.create_new_recording(category).unwrap();
        recording.set_data("input", input);
        recording.set_data(&output_interception_key("operation", 1), output);

        let mut all_metadata: Metadata = metadata.as_object().cloned().unwrap_or_default();
        all_metadata.insert(DURATION.to_string(), json!(0.01));
        all_metadata.insert(RECORDED_AT.to_string(), json!(Utc::now().to_rfc3339()));
        recording.add_metadata(all_metadata);

        self.cassette.save_recording(recording.as_mut()).unwrap();
        recording.id().to_string()
    }
}

impl TapeRecorder for FakeTapeRecorder {
    fn cassette(&self) -> Arc<dyn TapeCassette> {
        self.cassette.clone()
    }

    fn play(&self, recording_id: &str, playback_function: &PlaybackFunction) -> Result<Playback> {
        let recording: Arc<dyn Recording> = Arc::from(self.cassette.get_recording(recording_id)?);

        let start = Instant::now();
        let value = match playback_function(recording.as_ref()) {
            Ok(value) => value,
            Err(e) => json!({ "error": format!("{:#}", e) }),
        };
        let playback_duration = start.elapsed();

        Ok(Playback {
            recorded_outputs: extract_recorded_outputs(recording.as_ref())?,
            playback_outputs: vec![Output::new(output_interception_key("operation", 1), value)],
            recorded_duration: recording.get_metadata().get(DURATION).and_then(Value::as_f64),
            playback_duration,
            original_recording: recording,
        })
    }
}
