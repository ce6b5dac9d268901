// packages/engine/src/interception/input_interception.rs
//! Input interception contract

use crate::interception::invocation::InvocationArgs;
use crate::utils::errors::Result;
use serde_json::Value;

/// Pluggable hook applied to input-producing call sites
pub trait InputInterceptionHandler: Send + Sync {
    /// Turn the live input `result` into the form stored in the recording
    ///
    /// Called once, right after the intercepted call returned.
    fn prepare_input_for_recording(
        &self,
        interception_key: &str,
        result: &Value,
        invocation: &InvocationArgs,
    ) -> Result<Value>;

    /// Rebuild the input from `recorded_data` during replay
    ///
    /// May perform side effects that make the value usable (e.g. writing a
    /// file) and returns what the intercepted call should appear to return.
    fn restore_input_from_recording(
        &self,
        recorded_data: &Value,
        invocation: &InvocationArgs,
    ) -> Result<Value>;
}
