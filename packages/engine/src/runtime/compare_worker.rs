// packages/engine/src/runtime/compare_worker.rs
//! Dedicated comparison worker with timeout and recycling
//!
//! Comparisons can run on a long-lived worker thread instead of the caller's
//! thread. The worker is created lazily, reused across comparisons and
//! replaced after `recycle_rate` comparisons to bound resource growth.
//!
//! # Protocol
//!
//! ```text
//! main thread                               worker (playback-runner-N)
//!     │  tasks.send(recording_id)  ──────────→  recv_timeout(50ms)
//!     │                                          play_and_compare()
//!     │  results.recv_timeout(≤1s)  ←──────────  Succeeded(result) / Failed(text)
//!     │
//!     ├─ result         → return it
//!     ├─ worker dead    → discard worker, fatal `WorkerDied`
//!     └─ total timeout  → cancel + detach worker, fatal `ComparisonTimeout`
//! ```
//!
//! Each worker owns its own channel pair, so a worker that was abandoned
//! after a timeout can never deliver a stale result to its successor.

use crate::observability::{WORKER_DISCARDED_TOTAL, WORKER_SPAWNED_TOTAL};
use crate::studio::comparison::{CompareExecutionConfig, PlayAndCompareResult};
use crate::utils::errors::{PlaybackError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long the worker waits for a task before re-checking for termination
const TASK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest single wait of the main thread for a result
const RESULT_POLL_SLICE: Duration = Duration::from_secs(1);

/// Work executed on the worker for each recording id
pub trait CompareTask: Send + Sync + 'static {
    fn play_and_compare(&self, recording_id: &str) -> PlayAndCompareResult;
}

impl<F> CompareTask for F
where
    F: Fn(&str) -> PlayAndCompareResult + Send + Sync + 'static,
{
    fn play_and_compare(&self, recording_id: &str) -> PlayAndCompareResult {
        self(recording_id)
    }
}

/// Message sent back by the worker for each task
#[derive(Debug)]
pub enum WorkerReply {
    Succeeded(Box<PlayAndCompareResult>),

    /// The task panicked; carries the panic message
    Failed(String),
}

/// Marks the worker dead when its thread exits, however it exits
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One spawned worker thread and its channels
struct WorkerHandle {
    generation: u64,
    tasks: Sender<String>,
    results: Receiver<WorkerReply>,
    alive: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,

    /// Comparisons handed to this worker
    age: u32,
}

impl WorkerHandle {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Ask the worker to stop and wait for it to exit
    fn stop_and_join(mut self) {
        self.terminate.store(true, Ordering::SeqCst);
        let generation = self.generation;
        let thread = self.thread.take();
        drop(self);

        if let Some(thread) = thread {
            if thread.join().is_err() {
                warn!("Playback runner {} exited with a panic", generation);
            }
        }
    }

    /// Cancel the worker and stop tracking it without waiting
    fn abandon(self) {
        self.terminate.store(true, Ordering::SeqCst);
        metrics::counter!(WORKER_DISCARDED_TOTAL).increment(1);
        debug!("Abandoned playback runner {}", self.generation);
    }
}

/// Lazily spawned, recycled worker executing comparisons one at a time
///
/// A worker that exceeds the timeout is abandoned, not stopped: its thread
/// keeps running the current comparison to completion, so side effects of a
/// timed out comparison may still happen after `ComparisonTimeout` was
/// returned. Its result is dropped. A timeout that does not fit a `Duration`
/// or an `Instant` means no deadline.
pub struct DedicatedWorker {
    task: Arc<dyn CompareTask>,
    /// `None` when the configured timeout cannot be represented
    timeout: Option<Duration>,
    recycle_rate: u32,
    current: Option<WorkerHandle>,

    /// Workers spawned so far
    spawned: u64,

    /// Comparisons answered by any worker
    served: u64,
}

impl DedicatedWorker {
    pub fn new(task: Arc<dyn CompareTask>, config: &CompareExecutionConfig) -> Self {
        Self {
            task,
            timeout: Duration::try_from_secs_f64(config.process_timeout_seconds.max(0.0)).ok(),
            recycle_rate: config.process_recycle_rate.max(1),
            current: None,
            spawned: 0,
            served: 0,
        }
    }

    /// Generation of the current worker, `None` before the first spawn or
    /// after the worker was discarded
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|handle| handle.generation)
    }

    /// Comparisons answered so far
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Play and compare `recording_id` on the worker
    ///
    /// Errors are fatal to the comparison run: the worker died or the
    /// comparison exceeded the configured timeout.
    pub fn execute(&mut self, recording_id: &str) -> Result<PlayAndCompareResult> {
        self.ensure_worker()?;
        let handle = self.current_handle()?;
        handle.age += 1;

        if handle.tasks.send(recording_id.to_string()).is_err() {
            return Err(self.discard_dead_worker(recording_id));
        }

        let deadline = self.timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(self.handle_timeout(recording_id));
                    }
                    remaining.min(RESULT_POLL_SLICE)
                }
                None => RESULT_POLL_SLICE,
            };

            let handle = self.current_handle()?;
            match handle.results.recv_timeout(wait) {
                Ok(WorkerReply::Succeeded(result)) => {
                    self.served += 1;
                    return Ok(*result);
                }
                Ok(WorkerReply::Failed(error)) => {
                    self.served += 1;
                    return Ok(PlayAndCompareResult::failure(recording_id, error));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !handle.is_alive() {
                        return Err(self.discard_dead_worker(recording_id));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(self.discard_dead_worker(recording_id));
                }
            }
        }
    }

    /// Stop the current worker and wait for it to exit
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.current.take() {
            info!("Stopping playback runner {}", handle.generation);
            handle.stop_and_join();
        }
    }

    fn current_handle(&mut self) -> Result<&mut WorkerHandle> {
        self.current
            .as_mut()
            .ok_or_else(|| PlaybackError::WorkerDied("no playback runner available".to_string()))
    }

    /// Replace a dead or worn out worker, spawning one if none exists
    fn ensure_worker(&mut self) -> Result<()> {
        if let Some(handle) = self.current.take() {
            if !handle.is_alive() {
                warn!(
                    "Playback runner {} is not alive, replacing it",
                    handle.generation
                );
                handle.abandon();
            } else if handle.age >= self.recycle_rate {
                info!(
                    "Recycling playback runner {} after {} comparisons",
                    handle.generation, handle.age
                );
                handle.stop_and_join();
            } else {
                self.current = Some(handle);
            }
        }

        if self.current.is_none() {
            self.current = Some(self.spawn_worker()?);
        }
        Ok(())
    }

    fn spawn_worker(&mut self) -> Result<WorkerHandle> {
        let generation = self.spawned + 1;
        let (task_tx, task_rx) = bounded::<String>(1);
        let (result_tx, result_rx) = bounded::<WorkerReply>(1);
        let alive = Arc::new(AtomicBool::new(true));
        let terminate = Arc::new(AtomicBool::new(false));

        let task = Arc::clone(&self.task);
        let worker_alive = Arc::clone(&alive);
        let worker_terminate = Arc::clone(&terminate);

        let thread = thread::Builder::new()
            .name(format!("playback-runner-{}", generation))
            .spawn(move || run_worker(task, task_rx, result_tx, worker_terminate, worker_alive))
            .map_err(|e| {
                PlaybackError::WorkerSpawnFailed(format!(
                    "Failed to spawn playback runner {}: {}",
                    generation, e
                ))
            })?;

        self.spawned = generation;
        metrics::counter!(WORKER_SPAWNED_TOTAL).increment(1);
        debug!("Spawned playback runner {}", generation);

        Ok(WorkerHandle {
            generation,
            tasks: task_tx,
            results: result_rx,
            alive,
            terminate,
            thread: Some(thread),
            age: 0,
        })
    }

    fn discard_dead_worker(&mut self, recording_id: &str) -> PlaybackError {
        if let Some(handle) = self.current.take() {
            handle.abandon();
        }
        PlaybackError::WorkerDied(format!(
            "playback runner died while comparing recording {}",
            recording_id
        ))
    }

    fn handle_timeout(&mut self, recording_id: &str) -> PlaybackError {
        warn!("Waiting for comparison result timed out");
        if let Some(handle) = self.current.take() {
            handle.abandon();
        }
        PlaybackError::ComparisonTimeout {
            recording_id: recording_id.to_string(),
            timeout_secs: self.timeout.map_or(f64::INFINITY, |timeout| timeout.as_secs_f64()),
        }
    }
}

impl Drop for DedicatedWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.terminate.store(true, Ordering::SeqCst);
        }
    }
}

fn run_worker(
    task: Arc<dyn CompareTask>,
    tasks: Receiver<String>,
    results: Sender<WorkerReply>,
    terminate: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
) {
    let _alive = AliveGuard(alive);

    while !terminate.load(Ordering::SeqCst) {
        let recording_id = match tasks.recv_timeout(TASK_POLL_INTERVAL) {
            Ok(recording_id) => recording_id,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let reply = match panic::catch_unwind(AssertUnwindSafe(|| task.play_and_compare(&recording_id))) {
            Ok(result) => WorkerReply::Succeeded(Box::new(result)),
            Err(payload) => {
                let error = panic_message(payload.as_ref());
                info!(
                    "Failure during play and compare in playback runner of id {} - {}",
                    recording_id, error
                );
                WorkerReply::Failed(error)
            }
        };

        // A cancelled worker must not deliver results
        if terminate.load(Ordering::SeqCst) || results.send(reply).is_err() {
            break;
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "playback runner panicked".to_string()
    }
}
