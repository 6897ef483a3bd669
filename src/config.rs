// Decoder and writer configuration, loaded from environment variables.

use flate2::Compression;

/// Compressed bytes handed to the inflater per step (16 KiB).
pub const DEFAULT_SLICE_BYTES: usize = 1 << 14;
/// Upper bound of one decoded chunk (16 KiB).
pub const DEFAULT_CHUNK_BYTES: usize = 1 << 14;
/// Gzip level used by the replay writer.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 1;

/// Replay decoding/encoding configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Size of each compressed input slice fed to the inflater.
    pub slice_bytes: usize,
    /// Maximum size of one decoded chunk handed to the depth scanner.
    pub chunk_bytes: usize,
    /// Gzip compression level (0-9) for the replay writer.
    pub compression_level: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            slice_bytes: DEFAULT_SLICE_BYTES,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SWARM_REPLAY_SLICE_BYTES` - compressed slice size (default: 16384)
    /// - `SWARM_REPLAY_CHUNK_BYTES` - decoded chunk size (default: 16384)
    /// - `SWARM_REPLAY_COMPRESSION` - writer gzip level 0-9 (default: 1)
    ///
    /// Unparseable values fall back to the default.
    pub fn load() -> Self {
        let defaults = ReplayConfig::default();
        ReplayConfig {
            slice_bytes: Self::env_value("SWARM_REPLAY_SLICE_BYTES")
                .unwrap_or(defaults.slice_bytes),
            chunk_bytes: Self::env_value("SWARM_REPLAY_CHUNK_BYTES")
                .unwrap_or(defaults.chunk_bytes),
            compression_level: Self::env_value("SWARM_REPLAY_COMPRESSION")
                .unwrap_or(defaults.compression_level),
        }
        .normalized()
    }

    /// Same configuration with both sizes set to `bytes`. Mostly useful in tests.
    pub fn with_chunk_size(bytes: usize) -> Self {
        ReplayConfig {
            slice_bytes: bytes,
            chunk_bytes: bytes,
            ..ReplayConfig::default()
        }
        .normalized()
    }

    /// Clamp sizes to at least one byte and the level to 0-9.
    pub fn normalized(self) -> Self {
        ReplayConfig {
            slice_bytes: self.slice_bytes.max(1),
            chunk_bytes: self.chunk_bytes.max(1),
            compression_level: self.compression_level.min(9),
        }
    }

    pub fn compression(&self) -> Compression {
        Compression::new(self.compression_level)
    }

    fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
        std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
    }
}
