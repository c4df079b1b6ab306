//! Configuration for casseq
//!
//! Runtime options supplied to [`Store::open`](crate::Store::open). Only the
//! stride is persisted (see [`crate::manifest`]); everything else applies to
//! the current open only.

/// Options for opening a store
#[derive(Debug, Clone, Default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Bytes per entry.
    ///
    /// Required when the store is created; afterwards `None` means
    /// "use the stride recorded in the manifest".
    pub stride: Option<u64>,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync the row file
    pub sync_strategy: SyncStrategy,
}

/// Row file sync strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Only on explicit `sync()` (fastest; unsynced appends may be lost on crash)
    #[default]
    Manual,

    /// fsync after every append (safest, slowest)
    EveryAppend,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config that only sets the stride
    pub fn with_stride(stride: u64) -> Self {
        Self::builder().stride(stride).build()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the entry stride (in bytes)
    pub fn stride(mut self, stride: u64) -> Self {
        self.config.stride = Some(stride);
        self
    }

    /// Set the row file sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
