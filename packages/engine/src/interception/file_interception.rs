// packages/engine/src/interception/file_interception.rs
//! Shared machinery of the file interception handlers
//!
//! The intercepted file path comes from a named argument, or from a
//! positional one when the name was not passed. Files up to the size cap are
//! recorded as `{file_path, file_content}` with base64 content; larger files
//! keep only their path and the `above interception limit` marker, so their
//! content cannot be restored.

use crate::interception::invocation::InvocationArgs;
use crate::utils::config::{mb_size, InterceptedSizeLimit, PlaybackConfig};
use crate::utils::errors::{PlaybackError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Content marker of files above the interception size limit
pub const ABOVE_LIMIT_CONTENT: &str = "above interception limit";

/// Recorded form of an intercepted file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptedFile {
    pub file_path: String,

    /// Base64 content, or [`ABOVE_LIMIT_CONTENT`]
    pub file_content: String,
}

/// Restored content of an intercepted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),

    /// The file was above the size limit when recorded
    AboveLimit,
}

/// Locates, size-checks and encodes intercepted files
#[derive(Debug, Clone)]
pub struct FileInterception {
    file_path_arg_index: usize,
    file_path_arg_name: String,
    size_limit: InterceptedSizeLimit,
}

impl FileInterception {
    /// Create with the size limit taken from configuration
    pub fn new(file_path_arg_index: usize, file_path_arg_name: impl Into<String>) -> Result<Self> {
        let config = PlaybackConfig::load()?;
        Ok(Self::with_size_limit(
            file_path_arg_index,
            file_path_arg_name,
            config.intercepted_file_size_limit,
        ))
    }

    pub fn with_size_limit(
        file_path_arg_index: usize,
        file_path_arg_name: impl Into<String>,
        size_limit: InterceptedSizeLimit,
    ) -> Self {
        Self {
            file_path_arg_index,
            file_path_arg_name: file_path_arg_name.into(),
            size_limit,
        }
    }

    pub fn size_limit(&self) -> InterceptedSizeLimit {
        self.size_limit
    }

    /// Path of the intercepted file in `invocation`
    pub fn file_path(&self, invocation: &InvocationArgs) -> Result<PathBuf> {
        let value = invocation
            .argument(self.file_path_arg_index, &self.file_path_arg_name)
            .ok_or_else(|| {
                PlaybackError::Interception(format!(
                    "No file path passed as '{}' or at position {}",
                    self.file_path_arg_name, self.file_path_arg_index
                ))
            })?;

        value.as_str().map(PathBuf::from).ok_or_else(|| {
            PlaybackError::Interception(format!("File path argument is not a string: {}", value))
        })
    }

    /// Capture the file referenced by `invocation` in its recorded form
    pub fn intercept_file(&self, invocation: &InvocationArgs) -> Result<Value> {
        let file_path = self.file_path(invocation)?;

        if self.is_above_size_limit(&file_path)? {
            return Ok(serde_json::to_value(Self::above_limit_result(&file_path))?);
        }

        info!("Reading intercepted file ({})", file_path.display());

        let start = Instant::now();
        let content = std::fs::read(&file_path)?;
        info!(
            "Done reading content size is {:.2}MB ({})",
            mb_size(content.len() as u64),
            file_path.display()
        );
        let result = Self::serialize_file(&content, &file_path);

        info!(
            "Done preparing file for recording with in {:.2}s ({})",
            start.elapsed().as_secs_f64(),
            file_path.display()
        );
        Ok(serde_json::to_value(result)?)
    }

    fn is_above_size_limit(&self, file_path: &Path) -> Result<bool> {
        let size = std::fs::metadata(file_path)?.len();
        if self.size_limit.is_exceeded_by(size) {
            info!(
                "Intercepted file is {:.2}MB which is above interception limit of {}, ignoring content ({})",
                mb_size(size),
                self.size_limit,
                file_path.display()
            );
            return Ok(true);
        }
        Ok(false)
    }

    fn above_limit_result(file_path: &Path) -> InterceptedFile {
        InterceptedFile {
            file_path: file_path.to_string_lossy().into_owned(),
            file_content: ABOVE_LIMIT_CONTENT.to_string(),
        }
    }

    /// Recorded form of `content` read from `file_path`
    pub fn serialize_file(content: &[u8], file_path: &Path) -> InterceptedFile {
        InterceptedFile {
            file_path: file_path.to_string_lossy().into_owned(),
            file_content: general_purpose::STANDARD.encode(content),
        }
    }

    /// Path and content of a recorded file
    pub fn deserialize_file(recorded_data: &Value) -> Result<(String, FileContent)> {
        let recorded = InterceptedFile::deserialize(recorded_data).map_err(|e| {
            PlaybackError::Interception(format!("Malformed intercepted file data: {}", e))
        })?;

        if recorded.file_content == ABOVE_LIMIT_CONTENT {
            return Ok((recorded.file_path, FileContent::AboveLimit));
        }

        let bytes = general_purpose::STANDARD
            .decode(recorded.file_content.as_bytes())
            .map_err(|e| {
                PlaybackError::Interception(format!(
                    "Invalid content of intercepted file {}: {}",
                    recorded.file_path, e
                ))
            })?;
        Ok((recorded.file_path, FileContent::Bytes(bytes)))
    }
}
