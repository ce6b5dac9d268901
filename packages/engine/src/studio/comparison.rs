// packages/engine/src/studio/comparison.rs
//! Comparison verdicts and execution settings

use crate::recorder::{OperationResult, Playback};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of comparing a recorded result with its playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EqualityStatus {
    Equal,
    Fixed,
    Different,
    Failed,

    /// The comparison itself could not be performed
    EqualizerFailure,
}

impl EqualityStatus {
    pub const ALL: [EqualityStatus; 5] = [
        EqualityStatus::Equal,
        EqualityStatus::Fixed,
        EqualityStatus::Different,
        EqualityStatus::Failed,
        EqualityStatus::EqualizerFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EqualityStatus::Equal => "Equal",
            EqualityStatus::Fixed => "Fixed",
            EqualityStatus::Different => "Different",
            EqualityStatus::Failed => "Failed",
            EqualityStatus::EqualizerFailure => "EqualizerFailure",
        }
    }
}

impl fmt::Display for EqualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict produced by a comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorResult {
    pub equality_status: EqualityStatus,

    /// Optional human readable explanation
    pub message: Option<String>,

    /// Optional structured difference
    pub diff: Option<Value>,
}

impl ComparatorResult {
    pub fn new(equality_status: EqualityStatus) -> Self {
        Self {
            equality_status,
            message: None,
            diff: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_diff(mut self, diff: Value) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Verdict of a recording whose comparison could not be performed
    pub fn failure_result(recording_id: &str, error: impl fmt::Display) -> Self {
        Self::new(EqualityStatus::EqualizerFailure).with_message(format!(
            "Failure on recording {} - {}",
            recording_id, error
        ))
    }
}

impl fmt::Display for ComparatorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) if !message.is_empty() => {
                write!(f, "{} - {}", self.equality_status, message)
            }
            _ => write!(f, "{}", self.equality_status),
        }
    }
}

/// Raw comparator return value, either a bare status or a full verdict
#[derive(Debug, Clone, PartialEq)]
pub enum ComparatorOutput {
    Status(EqualityStatus),
    Detailed(ComparatorResult),
}

impl From<EqualityStatus> for ComparatorOutput {
    fn from(status: EqualityStatus) -> Self {
        ComparatorOutput::Status(status)
    }
}

impl From<ComparatorResult> for ComparatorOutput {
    fn from(result: ComparatorResult) -> Self {
        ComparatorOutput::Detailed(result)
    }
}

impl From<ComparatorOutput> for ComparatorResult {
    fn from(output: ComparatorOutput) -> Self {
        match output {
            ComparatorOutput::Status(status) => ComparatorResult::new(status),
            ComparatorOutput::Detailed(result) => result,
        }
    }
}

/// Verdict of one recording
#[derive(Debug, Clone)]
pub struct Comparison {
    pub comparator_result: ComparatorResult,

    /// Recorded result, kept only when configured to
    pub recorded_result: Option<OperationResult>,

    /// Playback result, kept only when configured to
    pub playback_result: Option<OperationResult>,

    pub recorded_is_error: bool,
    pub playback_is_error: bool,

    /// The playback, absent when the comparison failed
    pub playback: Option<Playback>,

    pub recording_id: String,
}

impl Comparison {
    pub fn equality_status(&self) -> EqualityStatus {
        self.comparator_result.equality_status
    }

    /// Verdict of a recording whose comparison could not be performed
    pub fn failure(recording_id: &str, error: impl fmt::Display) -> Self {
        Self {
            comparator_result: ComparatorResult::failure_result(recording_id, error),
            recorded_result: None,
            playback_result: None,
            recorded_is_error: false,
            playback_is_error: false,
            playback: None,
            recording_id: recording_id.to_string(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.comparator_result, f)
    }
}

/// Result of playing and comparing one recording, as handed back by a worker
#[derive(Debug, Clone)]
pub struct PlayAndCompareResult {
    pub comparator_result: ComparatorResult,
    pub playback: Option<Playback>,
    pub recorded_is_error: bool,
    pub playback_is_error: bool,
}

impl PlayAndCompareResult {
    pub fn failure(recording_id: &str, error: impl fmt::Display) -> Self {
        Self {
            comparator_result: ComparatorResult::failure_result(recording_id, error),
            playback: None,
            recorded_is_error: false,
            playback_is_error: false,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.comparator_result.equality_status == EqualityStatus::EqualizerFailure
    }
}

/// How the equalizer executes comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareExecutionConfig {
    /// Run each comparison on a dedicated, recycled worker
    pub use_dedicated_process: bool,

    /// Attach recorded/playback results to each comparison
    pub keep_results_in_comparison: bool,

    /// Total time allowed for one comparison on the worker
    pub process_timeout_seconds: f64,

    /// Comparisons served by a worker before it is replaced
    pub process_recycle_rate: u32,
}

impl Default for CompareExecutionConfig {
    fn default() -> Self {
        Self {
            use_dedicated_process: false,
            keep_results_in_comparison: false,
            process_timeout_seconds: 60.0,
            process_recycle_rate: 100,
        }
    }
}

/// Running count of comparisons per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonStats {
    pub equal: usize,
    pub fixed: usize,
    pub different: usize,
    pub failed: usize,
    pub equalizer_failures: usize,
}

impl ComparisonStats {
    pub fn record(&mut self, status: EqualityStatus) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: EqualityStatus) -> usize {
        match status {
            EqualityStatus::Equal => self.equal,
            EqualityStatus::Fixed => self.fixed,
            EqualityStatus::Different => self.different,
            EqualityStatus::Failed => self.failed,
            EqualityStatus::EqualizerFailure => self.equalizer_failures,
        }
    }

    pub fn total(&self) -> usize {
        EqualityStatus::ALL.iter().map(|status| self.get(*status)).sum()
    }

    fn slot(&mut self, status: EqualityStatus) -> &mut usize {
        match status {
            EqualityStatus::Equal => &mut self.equal,
            EqualityStatus::Fixed => &mut self.fixed,
            EqualityStatus::Different => &mut self.different,
            EqualityStatus::Failed => &mut self.failed,
            EqualityStatus::EqualizerFailure => &mut self.equalizer_failures,
        }
    }
}

impl fmt::Display for ComparisonStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comparison stats: (equal - {}, fixed - {}, diff - {}, failed - {}, equalizer failures - {})",
            self.equal, self.fixed, self.different, self.failed, self.equalizer_failures
        )
    }
}
