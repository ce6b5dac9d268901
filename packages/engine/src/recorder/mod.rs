// packages/engine/src/recorder/mod.rs
//! Recorder contract
//!
//! The recorder performs live capture and drives a single replay. It lives
//! outside the engine; this module defines what the engine consumes from it:
//!
//! - **TapeRecorder**: `play(recording_id, playback_function) -> Playback`
//! - **Playback**: recorded vs. replayed outputs of one recording
//! - **OperationResult**: a replayed operation's outcome (value or error)
//! - well-known metadata keys written during capture

pub mod tape_recorder;

// Re-export commonly used types
pub use tape_recorder::{
    extract_recorded_outputs, OperationResult, Output, Playback, PlaybackFunction, TapeRecorder,
    DURATION, EXCEPTION_IN_OPERATION, INCOMPLETE_RECORDING, OPERATION_CLASS,
    OPERATION_OUTPUT_ALIAS, OUTPUT_KEY_PREFIX, RECORDED_AT,
};
