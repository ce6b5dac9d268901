// packages/engine/src/studio/tuning.rs
//! Per-category equalizer tuning
//!
//! A tuning bundles everything the equalizer needs to replay and judge the
//! recordings of one category. Tuners build them on demand and may fail, in
//! which case only that category is reported as failed.

use crate::recorder::{OperationResult, Output, PlaybackFunction};
use crate::recording::Recording;
use crate::studio::comparison::ComparatorOutput;
use serde_json::Value;
use std::sync::Arc;

/// Extracts the operation result from a list of outputs
pub type ResultExtractor = Arc<dyn Fn(&[Output]) -> anyhow::Result<OperationResult> + Send + Sync>;

/// Compares `(recorded, playback, comparison_data)`
pub type Comparator = Arc<
    dyn Fn(&OperationResult, &OperationResult, &Value) -> anyhow::Result<ComparatorOutput>
        + Send
        + Sync,
>;

/// Derives auxiliary comparator input from the original recording
pub type ComparisonDataExtractor = Arc<dyn Fn(&dyn Recording) -> anyhow::Result<Value> + Send + Sync>;

/// Player, extractors and comparator of one category
#[derive(Clone)]
pub struct EqualizerTuning {
    pub playback_function: PlaybackFunction,
    pub result_extractor: ResultExtractor,
    pub comparator: Comparator,
    pub comparison_data_extractor: Option<ComparisonDataExtractor>,
}

impl EqualizerTuning {
    pub fn new(
        playback_function: PlaybackFunction,
        result_extractor: ResultExtractor,
        comparator: Comparator,
    ) -> Self {
        Self {
            playback_function,
            result_extractor,
            comparator,
            comparison_data_extractor: None,
        }
    }

    pub fn with_comparison_data_extractor(mut self, extractor: ComparisonDataExtractor) -> Self {
        self.comparison_data_extractor = Some(extractor);
        self
    }
}

impl std::fmt::Debug for EqualizerTuning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizerTuning")
            .field("has_comparison_data_extractor", &self.comparison_data_extractor.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds the tuning of a category
pub trait EqualizerTuner: Send + Sync {
    fn create_category_tuning(&self, category: &str) -> anyhow::Result<EqualizerTuning>;
}
