// packages/engine/src/studio/mod.rs
//! Playback studio and comparison engine
//!
//! - **Comparison**: verdict types, execution settings and stats
//! - **Tuning**: per-category player/extractor/comparator bundles
//! - **Equalizer**: lazy per-recording play-and-compare engine
//! - **Lookup**: which recordings of a category to compare
//! - **Playback Studio**: multi-category orchestration
//!
//! # Architecture
//!
//! ```text
//! PlaybackStudio.play()
//!     │
//!     ├─ explicit ids ─→ group by category (sorted)
//!     └─ categories   ─→ lookup window per category
//!                              ↓
//!              EqualizerTuner.create_category_tuning()
//!                              ↓
//!        Equalizer ─→ [in-process | dedicated worker] ─→ Comparison stream
//! ```

pub mod comparison;
pub mod equalizer;
pub mod lookup;
pub mod playback_studio;
pub mod tuning;

// Re-export commonly used types
pub use comparison::{
    CompareExecutionConfig, ComparatorOutput, ComparatorResult, Comparison, ComparisonStats,
    EqualityStatus, PlayAndCompareResult,
};
pub use equalizer::{ComparisonRun, Equalizer, Player, RecordingIds};
pub use lookup::{find_matching_recording_ids, RecordingLookupProperties};
pub use playback_studio::{ComparisonStream, PlaybackStudio};
pub use tuning::{Comparator, ComparisonDataExtractor, EqualizerTuner, EqualizerTuning, ResultExtractor};
