// packages/engine/src/studio/playback_studio.rs
//! Playback studio
//!
//! Runs the equalizer over several categories. Recordings are either given
//! explicitly (grouped by their category) or looked up per category. Each
//! category fails independently: a tuning or lookup failure yields a single
//! error item for that category only.

use crate::recorder::TapeRecorder;
use crate::studio::comparison::{CompareExecutionConfig, Comparison};
use crate::studio::equalizer::{Equalizer, Player, RecordingIds};
use crate::studio::lookup::{find_matching_recording_ids, RecordingLookupProperties};
use crate::studio::tuning::EqualizerTuner;
use crate::utils::errors::{PlaybackError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Comparisons of one category
pub type ComparisonStream = Box<dyn Iterator<Item = Result<Comparison>> + Send>;

/// Plays and compares recordings of several categories
pub struct PlaybackStudio {
    categories: Vec<String>,
    equalizer_tuner: Arc<dyn EqualizerTuner>,
    tape_recorder: Arc<dyn TapeRecorder>,
    lookup_properties: RecordingLookupProperties,
    recording_ids: Option<Vec<String>>,
    compare_execution_config: CompareExecutionConfig,
}

impl PlaybackStudio {
    pub fn new(
        categories: Vec<String>,
        equalizer_tuner: Arc<dyn EqualizerTuner>,
        tape_recorder: Arc<dyn TapeRecorder>,
    ) -> Self {
        Self {
            categories,
            equalizer_tuner,
            tape_recorder,
            lookup_properties: RecordingLookupProperties::default(),
            recording_ids: None,
            compare_execution_config: CompareExecutionConfig::default(),
        }
    }

    pub fn with_lookup_properties(mut self, lookup_properties: RecordingLookupProperties) -> Self {
        self.lookup_properties = lookup_properties;
        self
    }

    /// Compare exactly these recordings instead of looking them up
    pub fn with_recording_ids(mut self, recording_ids: Vec<String>) -> Self {
        self.recording_ids = Some(recording_ids);
        self
    }

    pub fn with_compare_execution_config(mut self, config: CompareExecutionConfig) -> Self {
        self.compare_execution_config = config;
        self
    }

    /// Comparisons per category, keyed in lexicographic category order
    ///
    /// Comparisons run lazily as each stream is consumed. Fails only when an
    /// explicit recording id cannot be mapped to a category.
    pub fn play(&self) -> Result<BTreeMap<String, ComparisonStream>> {
        let categories_recordings = match &self.recording_ids {
            Some(recording_ids) => self.group_recording_ids_by_categories(recording_ids)?,
            None => self
                .categories
                .iter()
                .map(|category| (category.clone(), None))
                .collect(),
        };

        Ok(categories_recordings
            .into_iter()
            .map(|(category, recording_ids)| {
                let stream = self.play_category(&category, recording_ids);
                (category, stream)
            })
            .collect())
    }

    fn group_recording_ids_by_categories(
        &self,
        recording_ids: &[String],
    ) -> Result<BTreeMap<String, Option<Vec<String>>>> {
        let cassette = self.tape_recorder.cassette();
        let mut grouping: BTreeMap<String, Option<Vec<String>>> = BTreeMap::new();

        for recording_id in recording_ids {
            let category = cassette.extract_recording_category(recording_id)?;
            grouping
                .entry(category)
                .or_insert_with(|| Some(Vec::new()))
                .get_or_insert_with(Vec::new)
                .push(recording_id.clone());
        }
        Ok(grouping)
    }

    fn play_category(&self, category: &str, recording_ids: Option<Vec<String>>) -> ComparisonStream {
        info!("Playing Category {}", category);

        let tuning = match self.equalizer_tuner.create_category_tuning(category) {
            Ok(tuning) => tuning,
            Err(e) => {
                info!("Cannot tune equalizer for category {} - {:#}", category, e);
                return Self::single_error(PlaybackError::TuningFailed {
                    category: category.to_string(),
                    reason: format!("{:#}", e),
                });
            }
        };

        let recording_ids: RecordingIds = match recording_ids {
            Some(recording_ids) => Box::new(recording_ids.into_iter()),
            None => match find_matching_recording_ids(
                self.tape_recorder.as_ref(),
                category,
                &self.lookup_properties,
            ) {
                Ok(recording_ids) => recording_ids,
                Err(e) => {
                    info!("Cannot look up recordings of category {} - {}", category, e);
                    return Self::single_error(e);
                }
            },
        };

        let tape_recorder = Arc::clone(&self.tape_recorder);
        let playback_function = tuning.playback_function.clone();
        let player: Player =
            Arc::new(move |recording_id: &str| tape_recorder.play(recording_id, &playback_function));

        let mut equalizer = Equalizer::new(recording_ids, player, tuning.result_extractor, tuning.comparator)
            .with_compare_execution_config(self.compare_execution_config.clone());
        if let Some(extractor) = tuning.comparison_data_extractor {
            equalizer = equalizer.with_comparison_data_extractor(extractor);
        }

        Box::new(equalizer.run_comparison())
    }

    fn single_error(error: PlaybackError) -> ComparisonStream {
        Box::new(std::iter::once(Err(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{OperationResult, Output, INCOMPLETE_RECORDING};
    use crate::recording::Recording;
    use crate::studio::comparison::{ComparatorOutput, EqualityStatus};
    use crate::studio::tuning::EqualizerTuning;
    use crate::test_support::FakeTapeRecorder;
    use serde_json::{json, Value};

    /// Replays by doubling the recorded `input`; category "broken" cannot be tuned
    struct DoublingTuner;

    impl EqualizerTuner for DoublingTuner {
        fn create_category_tuning(&self, category: &str) -> anyhow::Result<EqualizerTuning> {
            if category == "broken" {
                anyhow::bail!("no tuning for {}", category);
            }

            Ok(EqualizerTuning::new(
                Arc::new(|recording: &dyn Recording| -> anyhow::Result<Value> {
                    let input = recording.get_data("input")?;
                    Ok(json!(input.as_i64().unwrap_or_default() * 2))
                }),
                Arc::new(|outputs: &[Output]| -> anyhow::Result<OperationResult> {
                    Ok(OperationResult::Returned(
                        outputs.first().map(|o| o.value.clone()).unwrap_or(Value::Null),
                    ))
                }),
                Arc::new(
                    |recorded: &OperationResult, played: &OperationResult, _: &Value| -> anyhow::Result<ComparatorOutput> {
                        Ok(if recorded == played {
                            EqualityStatus::Equal.into()
                        } else {
                            EqualityStatus::Different.into()
                        })
                    },
                ),
            ))
        }
    }

    fn studio(recorder: &Arc<FakeTapeRecorder>, categories: &[&str]) -> PlaybackStudio {
        PlaybackStudio::new(
            categories.iter().map(|c| c.to_string()).collect(),
            Arc::new(DoublingTuner),
            recorder.clone(),
        )
    }

    #[test]
    fn test_play_looked_up_categories() {
        let recorder = Arc::new(FakeTapeRecorder::new());
        recorder.record("checkout", json!(2), json!(4), json!({}));
        recorder.record("checkout", json!(3), json!(7), json!({}));
        recorder.record("checkout", json!(5), json!(10), json!({INCOMPLETE_RECORDING: true}));
        recorder.record("search", json!(1), json!(2), json!({}));

        let mut results = studio(&recorder, &["search", "checkout"]).play().unwrap();
        let keys: Vec<&String> = results.keys().collect();
        assert_eq!(keys, vec!["checkout", "search"]);

        let checkout: Vec<EqualityStatus> = results
            .remove("checkout")
            .unwrap()
            .map(|comparison| comparison.unwrap().equality_status())
            .collect();
        assert_eq!(checkout, vec![EqualityStatus::Equal, EqualityStatus::Different]);

        let search: Vec<Comparison> = results
            .remove("search")
            .unwrap()
            .map(|comparison| comparison.unwrap())
            .collect();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].equality_status(), EqualityStatus::Equal);
    }

    #[test]
    fn test_tuning_failure_is_isolated() {
        let recorder = Arc::new(FakeTapeRecorder::new());
        recorder.record("checkout", json!(2), json!(4), json!({}));

        let mut results = studio(&recorder, &["broken", "checkout"]).play().unwrap();

        let broken: Vec<Result<Comparison>> = results.remove("broken").unwrap().collect();
        assert_eq!(broken.len(), 1);
        assert!(matches!(
            &broken[0],
            Err(PlaybackError::TuningFailed { category, .. }) if category == "broken"
        ));

        let checkout: Vec<Result<Comparison>> = results.remove("checkout").unwrap().collect();
        assert_eq!(checkout.len(), 1);
        assert!(checkout[0].is_ok());
    }

    #[test]
    fn test_explicit_ids_grouped_by_category() {
        let recorder = Arc::new(FakeTapeRecorder::new());
        let search = recorder.record("search", json!(1), json!(2), json!({}));
        let checkout_a = recorder.record("checkout", json!(2), json!(4), json!({}));
        let checkout_b = recorder.record("checkout", json!(3), json!(6), json!({}));
        let _ignored = recorder.record("checkout", json!(4), json!(8), json!({}));

        let results = studio(&recorder, &[])
            .with_recording_ids(vec![search.clone(), checkout_b.clone(), checkout_a.clone()])
            .play()
            .unwrap();

        let played: Vec<(String, Vec<String>)> = results
            .into_iter()
            .map(|(category, stream)| {
                let ids = stream.map(|c| c.unwrap().recording_id).collect();
                (category, ids)
            })
            .collect();

        assert_eq!(
            played,
            vec![
                ("checkout".to_string(), vec![checkout_b, checkout_a]),
                ("search".to_string(), vec![search]),
            ]
        );
    }

    #[test]
    fn test_unknown_recording_is_equalizer_failure() {
        let recorder = Arc::new(FakeTapeRecorder::new());
        let results = studio(&recorder, &[])
            .with_recording_ids(vec!["checkout/unknown".to_string()])
            .play()
            .unwrap();

        let comparisons: Vec<Comparison> = results
            .into_values()
            .flatten()
            .map(|comparison| comparison.unwrap())
            .collect();
        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].equality_status(), EqualityStatus::EqualizerFailure);
    }

    #[test]
    fn test_dedicated_worker_through_studio() {
        let recorder = Arc::new(FakeTapeRecorder::new());
        for i in 0..4 {
            recorder.record("checkout", json!(i), json!(i * 2), json!({}));
        }

        let config = CompareExecutionConfig {
            use_dedicated_process: true,
            process_recycle_rate: 3,
            ..CompareExecutionConfig::default()
        };
        let results = studio(&recorder, &["checkout"])
            .with_compare_execution_config(config)
            .play()
            .unwrap();

        let statuses: Vec<EqualityStatus> = results
            .into_values()
            .flatten()
            .map(|comparison| comparison.unwrap().equality_status())
            .collect();
        assert_eq!(statuses, vec![EqualityStatus::Equal; 4]);
    }
}
