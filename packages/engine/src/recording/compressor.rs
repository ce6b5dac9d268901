// packages/engine/src/recording/compressor.rs
//! zstd compression for persisted recordings
//!
//! Recordings are serialized to JSON and compressed before a cassette keeps
//! them. Going through the serialized form on every save surfaces
//! non-recordable data at capture time rather than at playback time.

use crate::recording::contract::Recording;
use crate::recording::memory::MemoryRecording;
use crate::utils::errors::{PlaybackError, Result};
use tracing::debug;

/// Compression levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Fast compression (level 1)
    Fast,

    /// Balanced (level 3)
    Balanced,

    /// Best compression (level 19)
    Best,
}

impl CompressionLevel {
    pub fn as_i32(&self) -> i32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Balanced => 3,
            CompressionLevel::Best => 19,
        }
    }
}

/// Compressor using zstd
#[derive(Debug, Clone)]
pub struct Compressor {
    level: CompressionLevel,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress data
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let level = self.level.as_i32();

        let compressed = zstd::encode_all(data, level)
            .map_err(|e| PlaybackError::Compression(format!("Compression error: {}", e)))?;

        debug!(
            "Compressed {} bytes -> {} bytes at level {}",
            data.len(),
            compressed.len(),
            level
        );

        Ok(compressed)
    }

    /// Decompress data
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::decode_all(data)
            .map_err(|e| PlaybackError::Compression(format!("Decompression error: {}", e)))
    }

    /// Serialize and compress a recording snapshot
    pub fn encode_recording(&self, recording: &dyn Recording) -> Result<Vec<u8>> {
        let snapshot = MemoryRecording::snapshot(recording)?;
        let json = serde_json::to_vec(&snapshot)?;
        self.compress(&json)
    }

    /// Decompress and deserialize a recording snapshot
    pub fn decode_recording(&self, data: &[u8]) -> Result<MemoryRecording> {
        let json = self.decompress(data)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressionLevel::Fast)
    }
}
