//! # `CoalesceConfig` – runtime knobs of the coalescing engine
//!
//! Read once when a [`CoalesceEngine`](crate::CoalesceEngine) is built. Only
//! `enabled` may change afterwards, through `CoalesceEngine::set_enabled`.

use thiserror::Error;

use crate::constants::{DEFAULT_MAX_DECOMPRESSED_BYTES, DEFAULT_TIMEOUT_MS};

/// Errors raised when validating a [`CoalesceConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A zero-length window would expire every clear on arrival
    #[error("Coalescing timeout must be greater than 0 ms")]
    ZeroTimeout,

    /// The decompression scratch buffer must be able to hold at least one message
    #[error("Decompressed size bound must be greater than 0 bytes")]
    ZeroDecompressedBound,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoalesceConfig {
    /// Master kill switch. When false every event passes through unmodified.
    pub enabled: bool,
    /// Window, in milliseconds, within which a restore must follow its clear
    /// to be coalesced. Also the age at which pending clears are force-replayed.
    pub timeout_ms: u32,
    /// Emit per-event diagnostic tracing at `debug` level. No behavioral effect.
    pub debug_log: bool,
    /// Upper bound on the declared decompressed size of a compressed update
    /// envelope. Larger envelopes are forwarded untouched.
    pub max_decompressed_bytes: usize,
}

impl CoalesceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_decompressed_bytes == 0 {
            return Err(ConfigError::ZeroDecompressedBound);
        }
        Ok(())
    }
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug_log: false,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}
