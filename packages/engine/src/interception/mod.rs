// packages/engine/src/interception/mod.rs
//! Interception layer
//!
//! Call sites instrumented for recording hand their live values to an
//! interception handler, which turns them into recordable data during capture
//! and back into usable values during replay:
//!
//! - **Invocation**: positional/named arguments of an intercepted call and the
//!   keys recordings store its data under
//! - **Input Interception**: contract for input-producing call sites
//! - **Output Interception**: contract for output-writing call sites
//! - **File Interception**: reference handlers for file-valued arguments,
//!   with a configurable size cap
//!
//! # Architecture
//!
//! ```text
//! capture:  live call ─→ prepare_*_for_recording() ─→ Recording.set_data(key, …)
//!
//! replay:   Recording.get_data(key) ─→ restore_input_from_recording() ─→ substituted value
//!                                  └─→ restore_output_from_recording() ─→ deferred output
//! ```

pub mod file_interception;
pub mod input_file;
pub mod input_interception;
pub mod invocation;
pub mod output_file;
pub mod output_interception;

// Re-export commonly used types
pub use file_interception::{FileContent, FileInterception, InterceptedFile, ABOVE_LIMIT_CONTENT};
pub use input_file::InputFileInterceptionHandler;
pub use input_interception::InputInterceptionHandler;
pub use invocation::{input_interception_key, output_interception_key, CapturedArg, InvocationArgs};
pub use output_file::{InterceptedOutputFile, OutputFileInterceptionHandler};
pub use output_interception::OutputInterceptionHandler;
