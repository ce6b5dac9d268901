// packages/engine/src/interception/input_file.rs
//! Input interception of file arguments

use crate::interception::file_interception::{FileContent, FileInterception};
use crate::interception::input_interception::InputInterceptionHandler;
use crate::interception::invocation::InvocationArgs;
use crate::utils::errors::{PlaybackError, Result};
use serde_json::Value;
use tracing::debug;

/// Records the content of a file an operation reads and rewrites it on replay
#[derive(Debug, Clone)]
pub struct InputFileInterceptionHandler {
    interception: FileInterception,
}

impl InputFileInterceptionHandler {
    pub fn new(interception: FileInterception) -> Self {
        Self { interception }
    }

    pub fn interception(&self) -> &FileInterception {
        &self.interception
    }
}

impl InputInterceptionHandler for InputFileInterceptionHandler {
    fn prepare_input_for_recording(
        &self,
        _interception_key: &str,
        _result: &Value,
        invocation: &InvocationArgs,
    ) -> Result<Value> {
        self.interception.intercept_file(invocation)
    }

    /// Writes the recorded content to the path of the current invocation and
    /// returns that path
    fn restore_input_from_recording(
        &self,
        recorded_data: &Value,
        invocation: &InvocationArgs,
    ) -> Result<Value> {
        let file_path = self.interception.file_path(invocation)?;
        let (recorded_path, content) = FileInterception::deserialize_file(recorded_data)?;

        match content {
            FileContent::Bytes(bytes) => {
                debug!(
                    "Restoring {} bytes recorded from {} into {}",
                    bytes.len(),
                    recorded_path,
                    file_path.display()
                );
                std::fs::write(&file_path, bytes)?;
            }
            FileContent::AboveLimit => {
                return Err(PlaybackError::Interception(format!(
                    "Content of {} was above the interception limit and cannot be restored",
                    recorded_path
                )));
            }
        }

        Ok(Value::String(file_path.to_string_lossy().into_owned()))
    }
}
