// packages/engine/src/lib.rs
//! Playback Engine Library
//!
//! Record-and-replay verification: recordings captured from instrumented
//! call sites are replayed against the current code and the replayed outputs
//! are compared with the recorded ones to detect behavioral drift.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **recording**: recording contract, storage port, in-memory cassette
//! - **recorder**: recorder contract consumed by the studio (`Playback`)
//! - **interception**: input/output interception handlers, file interception
//! - **studio**: equalizer (comparison engine), lookup, playback studio
//! - **runtime**: dedicated comparison worker with timeout and recycling
//! - **observability**: tracing setup and metric names
//! - **utils**: errors and configuration
//!
//! ```text
//! PlaybackStudio ─→ lookup / explicit ids ─→ Equalizer ─→ TapeRecorder.play()
//!                                               │              │
//!                                               │         TapeCassette
//!                                               ↓
//!                                    Comparison (per recording)
//! ```

// Public module exports
pub mod interception;
pub mod observability;
pub mod recorder;
pub mod recording;
pub mod runtime;
pub mod studio;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use recorder::{Playback, TapeRecorder};
pub use recording::{InMemoryTapeCassette, MemoryRecording, Recording, TapeCassette};
pub use studio::{
    CompareExecutionConfig, Comparison, EqualityStatus, Equalizer, PlaybackStudio,
    RecordingLookupProperties,
};
pub use utils::config::PlaybackConfig;
pub use utils::errors::{PlaybackError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
