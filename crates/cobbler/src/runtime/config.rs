//! Runtime configuration.
//!
//! The configuration is fixed the first time the runtime reads it: installing
//! one with [`configure`] only works before any class is registered or any
//! release pool is entered.
//!
//! ```
//! use cobbler::runtime::config::{self, RuntimeConfig};
//!
//! let cfg = RuntimeConfig::default().with_pool_capacity(64);
//! // Fails if something already used the runtime in this process.
//! let _ = config::configure(cfg);
//! assert!(config::config().pool_capacity >= 1);
//! ```

use crate::error::{Error, Result};
use std::sync::OnceLock;

/// Default size of a metadata arena chunk.
pub const DEFAULT_METADATA_CHUNK_SIZE: usize = 8192;

/// Default number of slots reserved up front by each release pool.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Tunables for the process-wide runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Initial chunk size of the arena holding class metadata.
    pub metadata_chunk_size: usize,
    /// Slots each release pool reserves when it is entered.
    pub pool_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            metadata_chunk_size: DEFAULT_METADATA_CHUNK_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Sets the metadata chunk size.
    #[must_use]
    pub fn with_metadata_chunk_size(mut self, bytes: usize) -> Self {
        self.metadata_chunk_size = bytes;
        self
    }

    /// Sets the per-pool reserved capacity.
    #[must_use]
    pub fn with_pool_capacity(mut self, slots: usize) -> Self {
        self.pool_capacity = slots;
        self
    }
}

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Installs `config` for the rest of the process.
///
/// # Errors
///
/// Returns [`Error::AlreadyConfigured`] if a configuration was installed
/// earlier or the runtime has already read the default one.
pub fn configure(config: RuntimeConfig) -> Result<()> {
    CONFIG.set(config).map_err(|_| Error::AlreadyConfigured)
}

/// Returns the active configuration, fixing the default on first use.
pub fn config() -> &'static RuntimeConfig {
    CONFIG.get_or_init(RuntimeConfig::default)
}
