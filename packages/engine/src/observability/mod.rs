// packages/engine/src/observability/mod.rs
//! Tracing setup and metric names
//!
//! The engine logs through `tracing` and emits `metrics` counters. Binaries
//! embedding the engine call [`init_tracing`] once; metric exporters are left
//! to the host application.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

/// Counter incremented once per comparison verdict, labelled by `status`
pub const COMPARISONS_TOTAL: &str = "playback_comparisons_total";

/// Counter incremented whenever a dedicated comparison worker is spawned
pub const WORKER_SPAWNED_TOTAL: &str = "playback_worker_spawned_total";

/// Counter incremented when a worker is discarded after a timeout or crash
pub const WORKER_DISCARDED_TOTAL: &str = "playback_worker_discarded_total";

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG` (default `info`). Set `PLAYBACK_LOG_FORMAT=json` for
/// JSON lines. Calling this more than once is a no-op.
pub fn init_tracing() -> anyhow::Result<()> {
    TRACING_INIT
        .get_or_try_init(|| {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            let json = std::env::var("PLAYBACK_LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false);

            let builder = fmt().with_env_filter(filter).with_target(true);
            let result = if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };

            result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
        })
        .map(|_| ())
}
