// packages/engine/src/recording/mod.rs
//! Recording data model and storage port
//!
//! - **Contract**: the `Recording` trait (capture lifecycle, deep-copy reads)
//! - **Memory**: `MemoryRecording`, the reference key/value recording
//! - **Cassette**: the `TapeCassette` storage port consumed by the studio
//! - **Metadata Filter**: equals / one-of / not matching used by lookups
//! - **In-Memory Cassette**: non-durable `TapeCassette` implementation
//! - **Compressor**: zstd compression of serialized recordings
//!
//! # Architecture
//!
//! ```text
//! capture ──→ create_new_recording() ──→ set_data / add_metadata
//!                                              ↓
//!                                   save_recording() (closes)
//!                                              ↓
//!                                 serialize (JSON) + zstd
//!                                              ↓
//! lookup  ──→ iter_recording_ids(category, query) ──→ get_recording()
//!                  (date window, metadata filter,        (read-only)
//!                   random sample, limit)
//! ```

pub mod cassette;
pub mod compressor;
pub mod contract;
pub mod in_memory_cassette;
pub mod memory;
pub mod metadata_filter;

// Re-export commonly used types
pub use cassette::{RecordingIdIter, RecordingMetadataIter, RecordingQuery, TapeCassette};
pub use compressor::{CompressionLevel, Compressor};
pub use contract::{deep_copy, Metadata, Recording};
pub use in_memory_cassette::InMemoryTapeCassette;
pub use memory::MemoryRecording;
pub use metadata_filter::{match_against_recorded_metadata, MetadataFilter, MetadataMatcher};
