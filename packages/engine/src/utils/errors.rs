// packages/engine/src/utils/errors.rs
//! Error taxonomy for recording, interception and playback comparison

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors raised by the playback engine
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A key was read from a recording that never stored it
    #[error("Key '{0}' not found in recording")]
    RecordingKey(String),

    /// The storage backend has no recording with this id
    #[error("No such recording: {0}")]
    NoSuchRecording(String),

    /// The replayed operation itself failed
    #[error("Operation failed during playback: {0}")]
    OperationExceptionDuringPlayback(String),

    /// An input interception key could not be derived from the invocation
    #[error("Failed creating input interception key: {0}")]
    InputInterceptionKeyCreation(String),

    /// Generic comparison failure for a single recording
    #[error("Comparison failed: {0}")]
    Comparison(String),

    /// The dedicated comparison worker exited while a result was expected
    #[error("Playback worker died: {0}")]
    WorkerDied(String),

    /// The dedicated comparison worker could not be started
    #[error("Failed to spawn playback worker: {0}")]
    WorkerSpawnFailed(String),

    /// No comparison result arrived within the configured timeout
    #[error("Timeout after {timeout_secs:.1}s while running playback and comparison of recording {recording_id}")]
    ComparisonTimeout {
        recording_id: String,
        timeout_secs: f64,
    },

    /// The category specific tuning could not be constructed
    #[error("Cannot tune equalizer for category {category}: {reason}")]
    TuningFailed { category: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Interception error: {0}")]
    Interception(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Worker-infrastructure failures abort a comparison run; everything else
    /// is recovered per recording.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlaybackError::WorkerDied(_)
                | PlaybackError::WorkerSpawnFailed(_)
                | PlaybackError::ComparisonTimeout { .. }
        )
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        PlaybackError::Config(err.to_string())
    }
}
