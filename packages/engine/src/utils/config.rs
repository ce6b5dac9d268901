// packages/engine/src/utils/config.rs
//! Engine configuration
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Optional configuration file (TOML, YAML or JSON, by extension)
//! 3. Environment variables prefixed with `PLAYBACK_`; nested keys use `__`
//!    (e.g. `PLAYBACK_COMPARE__PROCESS_TIMEOUT_SECONDS=30`)
//!
//! `PLAYBACK_INTERCEPTED_FILE_SIZE_LIMIT` caps file interception in megabytes.
//! Unset keeps the 500MB default, `null`/`none`/empty disables the cap.

use crate::studio::comparison::CompareExecutionConfig;
use crate::utils::errors::{PlaybackError, Result};
use config::{Config, Environment, File};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Default file interception cap (megabytes)
pub const DEFAULT_INTERCEPTED_FILE_SIZE_LIMIT_MB: f64 = 500.0;

const ENV_PREFIX: &str = "PLAYBACK";

/// Maximum size of a file whose content is captured by file interception
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum InterceptedSizeLimit {
    /// Files above this many megabytes are recorded without content
    Megabytes(f64),

    /// Every file is captured in full
    Unlimited,
}

impl InterceptedSizeLimit {
    /// Parse the textual form used by environment variables
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
        {
            return Ok(Self::Unlimited);
        }

        trimmed
            .parse::<f64>()
            .map(Self::Megabytes)
            .map_err(|e| {
                PlaybackError::Config(format!(
                    "invalid intercepted file size limit '{}': {}",
                    trimmed, e
                ))
            })
    }

    /// Whether a file of `size_bytes` exceeds the limit
    pub fn is_exceeded_by(&self, size_bytes: u64) -> bool {
        match self {
            Self::Megabytes(limit) => mb_size(size_bytes) > *limit,
            Self::Unlimited => false,
        }
    }
}

impl Default for InterceptedSizeLimit {
    fn default() -> Self {
        Self::Megabytes(DEFAULT_INTERCEPTED_FILE_SIZE_LIMIT_MB)
    }
}

impl fmt::Display for InterceptedSizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Megabytes(limit) => write!(f, "{:.2}MB", limit),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Size in megabytes
pub(crate) fn mb_size(size_bytes: u64) -> f64 {
    size_bytes as f64 / (1024.0 * 1024.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSizeLimit {
    Megabytes(f64),
    Text(String),
}

fn deserialize_size_limit<'de, D>(deserializer: D) -> std::result::Result<InterceptedSizeLimit, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawSizeLimit>::deserialize(deserializer)? {
        None => Ok(InterceptedSizeLimit::Unlimited),
        Some(RawSizeLimit::Megabytes(limit)) => Ok(InterceptedSizeLimit::Megabytes(limit)),
        Some(RawSizeLimit::Text(text)) => InterceptedSizeLimit::parse(&text).map_err(de::Error::custom),
    }
}

/// Settings used to build the default recording lookup window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// How far back (in days) the default window starts
    pub days_back: i64,

    /// Maximum recordings per category
    pub limit: Option<usize>,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            days_back: 7,
            limit: Some(20),
        }
    }
}

/// Top level engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// File interception cap
    #[serde(deserialize_with = "deserialize_size_limit")]
    pub intercepted_file_size_limit: InterceptedSizeLimit,

    /// Equalizer execution settings
    pub compare: CompareExecutionConfig,

    /// Studio default lookup window
    pub lookup: LookupSettings,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            intercepted_file_size_limit: InterceptedSizeLimit::default(),
            compare: CompareExecutionConfig::default(),
            lookup: LookupSettings::default(),
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from defaults and the environment
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    /// Load configuration from defaults, `path` (if it exists) and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!("Reading playback configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config: PlaybackConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let InterceptedSizeLimit::Megabytes(limit) = self.intercepted_file_size_limit {
            if !limit.is_finite() || limit < 0.0 {
                return Err(PlaybackError::Config(format!(
                    "intercepted file size limit must be a non-negative number, got {}",
                    limit
                )));
            }
        }

        if self.compare.process_timeout_seconds <= 0.0 {
            return Err(PlaybackError::Config(
                "compare.process_timeout_seconds must be positive".to_string(),
            ));
        }

        if self.compare.process_recycle_rate == 0 {
            return Err(PlaybackError::Config(
                "compare.process_recycle_rate must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
