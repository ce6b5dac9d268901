// packages/engine/src/runtime/mod.rs
//! Comparison execution runtime
//!
//! - **Compare Worker**: dedicated, recycled worker thread running one
//!   comparison at a time under a total timeout
//!
//! Comparisons run on the caller's thread unless the equalizer is configured
//! with `use_dedicated_process`.

pub mod compare_worker;

// Re-export commonly used types
pub use compare_worker::{CompareTask, DedicatedWorker, WorkerReply};
