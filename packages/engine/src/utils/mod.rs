// packages/engine/src/utils/mod.rs
//! Common utilities shared by every layer of the engine
//!
//! - **errors**: crate-wide error type and `Result` alias
//! - **config**: layered configuration (defaults, file, `PLAYBACK_*` env)

pub mod config;
pub mod errors;

pub use config::{InterceptedSizeLimit, LookupSettings, PlaybackConfig};
pub use errors::{PlaybackError, Result};
