// packages/engine/src/recorder/tape_recorder.rs
//! Types shared between the recorder and the comparison engine

use crate::recording::cassette::TapeCassette;
use crate::recording::contract::Recording;
use crate::utils::errors::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Metadata key holding the recorded run's duration in seconds
pub const DURATION: &str = "_tape_recorder_recording_duration";

/// Metadata key holding the capture time (RFC 3339, UTC)
pub const RECORDED_AT: &str = "_tape_recorder_recorded_at";

/// Metadata key holding the alias of the recorded operation
pub const OPERATION_OUTPUT_ALIAS: &str = "_tape_recorder_operation";

/// Metadata key holding the class of the recorded operation
pub const OPERATION_CLASS: &str = "_tape_recorder_operation_class";

/// Metadata key set when the recorded operation raised
pub const EXCEPTION_IN_OPERATION: &str = "_tape_recorder_exception_in_operation";

/// Metadata key set on captures that did not finish recording every output
///
/// Recordings created before this flag existed do not carry it at all.
pub const INCOMPLETE_RECORDING: &str = "_tape_recorder_incomplete_recording";

/// Data keys of captured outputs start with this prefix
pub const OUTPUT_KEY_PREFIX: &str = "output:";

/// One captured output of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub key: String,
    pub value: Value,
}

impl Output {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Outcome of an operation as seen by a result extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OperationResult {
    /// The operation returned a value
    Returned(Value),

    /// The operation failed with the given error text
    Raised(String),
}

impl OperationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Raised(_))
    }

    /// JSON view handed to comparators
    pub fn to_value(&self) -> Value {
        match self {
            OperationResult::Returned(value) => value.clone(),
            OperationResult::Raised(error) => serde_json::json!({ "error": error }),
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationResult::Returned(value) => write!(f, "{}", value),
            OperationResult::Raised(error) => write!(f, "raised: {}", error),
        }
    }
}

/// Result of replaying one recording against the current code
#[derive(Debug, Clone)]
pub struct Playback {
    /// Outputs captured during the original run
    pub recorded_outputs: Vec<Output>,

    /// Outputs produced by the replay
    pub playback_outputs: Vec<Output>,

    /// Duration of the original run in seconds, if it was recorded
    pub recorded_duration: Option<f64>,

    /// Duration of the replay
    pub playback_duration: Duration,

    /// The recording the replay was driven by
    pub original_recording: Arc<dyn Recording>,
}

impl Playback {
    pub fn recording_id(&self) -> &str {
        self.original_recording.id()
    }
}

/// Replays an operation from a recording
///
/// Errors returned by the function are treated as the operation's own failure
/// and become part of the playback output rather than aborting the replay.
pub type PlaybackFunction = Arc<dyn Fn(&dyn Recording) -> anyhow::Result<Value> + Send + Sync>;

/// The recorder as consumed by the engine
pub trait TapeRecorder: Send + Sync {
    /// Storage backing this recorder
    fn cassette(&self) -> Arc<dyn TapeCassette>;

    /// Replay `recording_id` through `playback_function`
    ///
    /// Fails with `NoSuchRecording` for unknown ids and with
    /// `OperationExceptionDuringPlayback` when the replay infrastructure
    /// itself cannot run the operation.
    fn play(&self, recording_id: &str, playback_function: &PlaybackFunction) -> Result<Playback>;
}

/// Outputs captured in `recording`, excluding the operation result entries
pub fn extract_recorded_outputs(recording: &dyn Recording) -> Result<Vec<Output>> {
    let mut keys: Vec<String> = recording
        .get_all_keys()
        .into_iter()
        .filter(|key| key.starts_with(OUTPUT_KEY_PREFIX) && !key.ends_with("result"))
        .collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let value = recording.get_data(&key)?;
            Ok(Output::new(key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::memory::MemoryRecording;
    use serde_json::json;

    #[test]
    fn test_operation_result_classification() {
        assert!(!OperationResult::Returned(json!(1)).is_error());
        assert!(OperationResult::Raised("boom".into()).is_error());
        assert_eq!(
            OperationResult::Raised("boom".into()).to_value(),
            json!({"error": "boom"})
        );
    }

    #[test]
    fn test_extract_recorded_outputs() {
        let mut recording = MemoryRecording::with_id("checkout/1");
        recording.set_data("input: cart", json!([1, 2]));
        recording.set_data("output: receipt", json!({"total": 3}));
        recording.set_data("output: audit", json!("ok"));
        recording.set_data("output: operation result", json!(3));

        let outputs = extract_recorded_outputs(&recording).unwrap();
        let keys: Vec<&str> = outputs.iter().map(|o| o.key.as_str()).collect();

        assert_eq!(keys, vec!["output: audit", "output: receipt"]);
        assert_eq!(outputs[1].value, json!({"total": 3}));
    }
}
