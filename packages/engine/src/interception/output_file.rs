// packages/engine/src/interception/output_file.rs
//! Output interception of file arguments

use crate::interception::file_interception::{FileContent, FileInterception, ABOVE_LIMIT_CONTENT};
use crate::interception::invocation::InvocationArgs;
use crate::interception::output_interception::OutputInterceptionHandler;
use crate::utils::errors::Result;
use serde_json::Value;
use std::path::Path;

/// Records the content of a file an operation writes
#[derive(Debug, Clone)]
pub struct OutputFileInterceptionHandler {
    interception: FileInterception,
}

impl OutputFileInterceptionHandler {
    pub fn new(interception: FileInterception) -> Self {
        Self { interception }
    }

    pub fn interception(&self) -> &FileInterception {
        &self.interception
    }
}

impl OutputInterceptionHandler for OutputFileInterceptionHandler {
    type Output = InterceptedOutputFile;

    fn prepare_output_for_recording(
        &self,
        _interception_key: &str,
        invocation: &InvocationArgs,
    ) -> Result<Value> {
        self.interception.intercept_file(invocation)
    }

    fn restore_output_from_recording(&self, recorded_data: &Value) -> Result<InterceptedOutputFile> {
        let (output_file_path, content) = FileInterception::deserialize_file(recorded_data)?;
        Ok(InterceptedOutputFile {
            output_file_path,
            content,
        })
    }
}

/// An intercepted output file, held without being written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedOutputFile {
    /// Where the file was written when recorded
    pub output_file_path: String,
    pub content: FileContent,
}

impl InterceptedOutputFile {
    pub fn is_above_limit(&self) -> bool {
        self.content == FileContent::AboveLimit
    }

    /// Write the held content to `path`
    ///
    /// Files recorded above the size limit are written as the limit marker.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        match &self.content {
            FileContent::Bytes(bytes) => std::fs::write(path, bytes)?,
            FileContent::AboveLimit => std::fs::write(path, ABOVE_LIMIT_CONTENT)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::InterceptedSizeLimit;
    use serde_json::json;
    use tempfile::TempDir;

    fn handler(limit: InterceptedSizeLimit) -> OutputFileInterceptionHandler {
        OutputFileInterceptionHandler::new(FileInterception::with_size_limit(0, "dest", limit))
    }

    #[test]
    fn test_restore_defers_write() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.txt");
        std::fs::write(&report, b"total: 30").unwrap();

        let handler = handler(InterceptedSizeLimit::default());
        let invocation = InvocationArgs::default().with_kwarg("dest", json!(report.to_string_lossy()));
        let recorded = handler
            .prepare_output_for_recording("output: report #1", &invocation)
            .unwrap();

        let held = handler.restore_output_from_recording(&recorded).unwrap();
        assert_eq!(held.output_file_path, report.to_string_lossy());
        assert!(!held.is_above_limit());

        let copy = dir.path().join("copy.txt");
        assert!(!copy.exists());
        held.write_to(&copy).unwrap();
        assert_eq!(std::fs::read(&copy).unwrap(), b"total: 30");
    }

    #[test]
    fn test_above_limit_writes_marker() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.txt");
        std::fs::write(&report, b"0123456789").unwrap();

        let handler = handler(InterceptedSizeLimit::Megabytes(0.0));
        let invocation = InvocationArgs::positional(vec![json!(report.to_string_lossy())]);
        let recorded = handler
            .prepare_output_for_recording("output: report #1", &invocation)
            .unwrap();

        let held = handler.restore_output_from_recording(&recorded).unwrap();
        assert!(held.is_above_limit());

        let copy = dir.path().join("copy.txt");
        held.write_to(&copy).unwrap();
        assert_eq!(std::fs::read_to_string(&copy).unwrap(), ABOVE_LIMIT_CONTENT);
    }
}
