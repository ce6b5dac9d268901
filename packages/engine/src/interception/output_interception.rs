// packages/engine/src/interception/output_interception.rs
//! Output interception contract

use crate::interception::invocation::InvocationArgs;
use crate::utils::errors::Result;
use serde_json::Value;

/// Pluggable hook applied to output-writing call sites
pub trait OutputInterceptionHandler: Send + Sync {
    /// Deferred form of a restored output
    type Output;

    /// Capture what the intercepted call is about to write, before the write
    fn prepare_output_for_recording(
        &self,
        interception_key: &str,
        invocation: &InvocationArgs,
    ) -> Result<Value>;

    /// Holder representing the recorded output, without performing the write
    fn restore_output_from_recording(&self, recorded_data: &Value) -> Result<Self::Output>;
}
