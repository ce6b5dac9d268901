// packages/engine/src/studio/equalizer.rs
//! Equalizer, the comparison engine
//!
//! Replays recordings one at a time and compares each playback result with
//! the recorded one:
//!
//! ```text
//! recording id ─→ player ─→ Playback ─→ result_extractor (recorded, playback)
//!                                              ↓
//!                          comparison_data_extractor(original recording)
//!                                              ↓
//!                                comparator ─→ Comparison
//! ```
//!
//! Comparisons are produced lazily, in input order. A failure while
//! comparing one recording becomes an `EqualizerFailure` verdict and the run
//! moves on. Only worker failures (death, timeout) end the run early.
//!
//! # Execution modes
//!
//! - **In-process** (default): each recording is compared on the iterating
//!   thread.
//! - **Dedicated worker**: comparisons run on a recycled worker thread with a
//!   total timeout per recording, see [`DedicatedWorker`].

use crate::observability::COMPARISONS_TOTAL;
use crate::recorder::Playback;
use crate::runtime::compare_worker::{panic_message, CompareTask, DedicatedWorker};
use crate::studio::comparison::{
    CompareExecutionConfig, ComparatorResult, Comparison, ComparisonStats, PlayAndCompareResult,
};
use crate::studio::tuning::{Comparator, ComparisonDataExtractor, ResultExtractor};
use crate::utils::errors::{PlaybackError, Result};
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

/// Replays one recording
pub type Player = Arc<dyn Fn(&str) -> Result<Playback> + Send + Sync>;

/// Recording ids consumed by a comparison run
pub type RecordingIds = Box<dyn Iterator<Item = String> + Send>;

/// Every iteration divisible by this logs the running stats
const STATS_LOG_INTERVAL: usize = 10;

/// Callbacks comparing a single recording
struct ComparisonCore {
    player: Player,
    result_extractor: ResultExtractor,
    comparator: Comparator,
    comparison_data_extractor: Option<ComparisonDataExtractor>,
}

impl ComparisonCore {
    fn try_play_and_compare(&self, recording_id: &str) -> anyhow::Result<PlayAndCompareResult> {
        let playback = (self.player)(recording_id)?;

        let recorded_result = (self.result_extractor)(playback.recorded_outputs.as_slice())?;
        let playback_result = (self.result_extractor)(playback.playback_outputs.as_slice())?;

        let comparison_data = match &self.comparison_data_extractor {
            Some(extractor) => extractor(playback.original_recording.as_ref())?,
            None => Value::Object(Map::new()),
        };

        let comparator_result: ComparatorResult =
            (self.comparator)(&recorded_result, &playback_result, &comparison_data)?.into();

        Ok(PlayAndCompareResult {
            comparator_result,
            recorded_is_error: recorded_result.is_error(),
            playback_is_error: playback_result.is_error(),
            playback: Some(playback),
        })
    }
}

impl CompareTask for ComparisonCore {
    fn play_and_compare(&self, recording_id: &str) -> PlayAndCompareResult {
        self.try_play_and_compare(recording_id).unwrap_or_else(|e| {
            info!("Failed playing recording id {} - {:#}", recording_id, e);
            PlayAndCompareResult::failure(recording_id, format!("{:#}", e))
        })
    }
}

/// Comparison engine over a sequence of recording ids
pub struct Equalizer {
    recording_ids: RecordingIds,
    core: ComparisonCore,
    config: CompareExecutionConfig,
}

impl Equalizer {
    pub fn new<I>(
        recording_ids: I,
        player: Player,
        result_extractor: ResultExtractor,
        comparator: Comparator,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self {
            recording_ids: Box::new(recording_ids.into_iter()),
            core: ComparisonCore {
                player,
                result_extractor,
                comparator,
                comparison_data_extractor: None,
            },
            config: CompareExecutionConfig::default(),
        }
    }

    pub fn with_comparison_data_extractor(mut self, extractor: ComparisonDataExtractor) -> Self {
        self.core.comparison_data_extractor = Some(extractor);
        self
    }

    pub fn with_compare_execution_config(mut self, config: CompareExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Start comparing; nothing runs until the returned iterator is polled
    pub fn run_comparison(self) -> ComparisonRun {
        ComparisonRun {
            recording_ids: self.recording_ids,
            core: Arc::new(self.core),
            config: self.config,
            worker: None,
            stats: ComparisonStats::default(),
            iteration: 0,
            completed: false,
            finished: false,
        }
    }
}

/// Lazy sequence of comparisons, one per recording id
///
/// Ends early with an `Err` item on worker failure. Finalization (stopping
/// the worker and logging the stats) runs exactly once, on exhaustion, on
/// fatal error or when the run is dropped.
pub struct ComparisonRun {
    recording_ids: RecordingIds,
    core: Arc<ComparisonCore>,
    config: CompareExecutionConfig,
    worker: Option<DedicatedWorker>,
    stats: ComparisonStats,
    iteration: usize,
    completed: bool,
    finished: bool,
}

impl ComparisonRun {
    /// Per status counts of the comparisons produced so far
    pub fn stats(&self) -> ComparisonStats {
        self.stats
    }

    /// Recording ids taken from the input so far
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    fn play_and_compare(&mut self, recording_id: &str) -> Result<PlayAndCompareResult> {
        if !self.config.use_dedicated_process {
            let core = &self.core;
            return Ok(
                panic::catch_unwind(AssertUnwindSafe(|| core.play_and_compare(recording_id))).unwrap_or_else(
                    |payload| {
                        let error = panic_message(payload.as_ref());
                        info!("Failure during play and compare of id {} - {}", recording_id, error);
                        PlayAndCompareResult::failure(recording_id, error)
                    },
                ),
            );
        }

        let core = Arc::clone(&self.core);
        let config = &self.config;
        let worker = self
            .worker
            .get_or_insert_with(|| DedicatedWorker::new(core, config));
        worker.execute(recording_id)
    }

    fn build_comparison(&self, recording_id: String, result: PlayAndCompareResult) -> Comparison {
        let (recorded_result, playback_result) = match &result.playback {
            Some(playback) if self.config.keep_results_in_comparison => {
                let extracted = (self.core.result_extractor)(playback.recorded_outputs.as_slice()).and_then(
                    |recorded| {
                        (self.core.result_extractor)(playback.playback_outputs.as_slice())
                            .map(|played| (recorded, played))
                    },
                );
                match extracted {
                    Ok((recorded, played)) => (Some(recorded), Some(played)),
                    Err(e) => {
                        return Comparison::failure(
                            &recording_id,
                            PlaybackError::Comparison(format!("result extraction failed: {:#}", e)),
                        )
                    }
                }
            }
            _ => (None, None),
        };

        Comparison {
            comparator_result: result.comparator_result,
            recorded_result,
            playback_result,
            recorded_is_error: result.recorded_is_error,
            playback_is_error: result.playback_is_error,
            playback: result.playback,
            recording_id,
        }
    }

    fn record(&mut self, comparison: &Comparison) {
        let status = comparison.equality_status();
        self.stats.record(status);
        metrics::counter!(COMPARISONS_TOTAL, "status" => status.as_str()).increment(1);

        info!(
            "Recording {} Comparison result: {}",
            comparison.recording_id, comparison
        );

        if self.iteration % STATS_LOG_INTERVAL == 0 {
            info!("Iteration {} {}", self.iteration, self.stats);
        }
    }

    fn finalize(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        // Dropping the worker cancels it and closes its channels
        self.worker.take();

        let prefix = if self.completed {
            "Completed all"
        } else {
            "Error during playback, executed"
        };
        info!("{} {} iterations, {}", prefix, self.iteration, self.stats);
    }
}

impl Iterator for ComparisonRun {
    type Item = Result<Comparison>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let recording_id = match self.recording_ids.next() {
            Some(recording_id) => recording_id,
            None => {
                self.completed = true;
                self.finalize();
                return None;
            }
        };
        self.iteration += 1;

        match self.play_and_compare(&recording_id) {
            Ok(result) => {
                let comparison = self.build_comparison(recording_id, result);
                self.record(&comparison);
                Some(Ok(comparison))
            }
            Err(e) if e.is_fatal() => {
                error!("Aborting comparison run at recording {}: {}", recording_id, e);
                self.finalize();
                Some(Err(e))
            }
            Err(e) => {
                let comparison = Comparison::failure(&recording_id, &e);
                self.record(&comparison);
                Some(Ok(comparison))
            }
        }
    }
}

impl Drop for ComparisonRun {
    fn drop(&mut self) {
        self.finalize();
    }
}
