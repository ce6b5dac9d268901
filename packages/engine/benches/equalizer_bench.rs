// packages/engine/benches/equalizer_bench.rs
//! In-process comparison throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use playback_engine::recorder::{OperationResult, Output, Playback};
use playback_engine::recording::MemoryRecording;
use playback_engine::studio::{
    ComparatorOutput, Comparator, EqualityStatus, Equalizer, Player, ResultExtractor,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn player() -> Player {
    let recording = Arc::new(MemoryRecording::with_id("bench/1"));
    Arc::new(move |_: &str| -> playback_engine::Result<Playback> {
        let outputs = vec![Output::new("output: op #1", json!({"items": [1, 2, 3], "total": 6}))];
        Ok(Playback {
            recorded_outputs: outputs.clone(),
            playback_outputs: outputs,
            recorded_duration: Some(0.01),
            playback_duration: Duration::from_micros(10),
            original_recording: recording.clone(),
        })
    })
}

fn extractor() -> ResultExtractor {
    Arc::new(|outputs: &[Output]| -> anyhow::Result<OperationResult> {
        Ok(OperationResult::Returned(
            outputs.first().map(|o| o.value.clone()).unwrap_or(Value::Null),
        ))
    })
}

fn comparator() -> Comparator {
    Arc::new(
        |recorded: &OperationResult, played: &OperationResult, _: &Value| -> anyhow::Result<ComparatorOutput> {
            Ok(if recorded == played {
                EqualityStatus::Equal.into()
            } else {
                EqualityStatus::Different.into()
            })
        },
    )
}

fn bench_in_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("equalizer_in_process");

    for count in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let ids: Vec<String> = (0..count).map(|i| format!("bench/{}", i)).collect();
                let equal = Equalizer::new(ids, player(), extractor(), comparator())
                    .run_comparison()
                    .filter(|comparison| {
                        matches!(comparison, Ok(c) if c.equality_status() == EqualityStatus::Equal)
                    })
                    .count();
                black_box(equal)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_in_process);
criterion_main!(benches);
