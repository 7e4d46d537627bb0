use crate::error::{PoolError, Result};

/// Default size of every block in a pool.
pub const DEFAULT_POOL_SIZE: usize = 16 * 1024;

/// Smallest pool size accepted by [`PoolConfig::validate`].
pub const MIN_POOL_SIZE: usize = 64;

/// Largest request served by bump allocation, whatever the block size.
pub const MAX_SMALL_ALLOC: usize = 4095;

/// Tuning knobs for a [`Pool`](crate::Pool).
///
/// ```rust
/// use rpool::PoolConfig;
///
/// let config = PoolConfig::new(4096).with_large_reuse_scan(8);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_small_size(), 4095);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
  /// Size in bytes of each block, including the first one.
  pub size: usize,
  /// Upper bound for requests served from blocks.
  pub max_small_ceiling: usize,
  /// How many of the newest large records are probed for a free slot.
  pub large_reuse_scan: usize,
  /// Scans start past a block that misses again after this many misses.
  pub failed_threshold: usize,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self::new(DEFAULT_POOL_SIZE)
  }
}

impl PoolConfig {
  pub const fn new(size: usize) -> Self {
    Self {
      size,
      max_small_ceiling: MAX_SMALL_ALLOC,
      large_reuse_scan: 4,
      failed_threshold: 4,
    }
  }

  pub const fn with_max_small_ceiling(
    mut self,
    ceiling: usize,
  ) -> Self {
    self.max_small_ceiling = ceiling;
    self
  }

  pub const fn with_large_reuse_scan(
    mut self,
    scan: usize,
  ) -> Self {
    self.large_reuse_scan = scan;
    self
  }

  pub const fn with_failed_threshold(
    mut self,
    threshold: usize,
  ) -> Self {
    self.failed_threshold = threshold;
    self
  }

  /// Largest request the bump path will take for this configuration.
  pub fn max_small_size(&self) -> usize {
    self.size.min(self.max_small_ceiling)
  }

  pub fn validate(&self) -> Result<()> {
    if self.size < MIN_POOL_SIZE {
      return Err(PoolError::InvalidSize {
        size: self.size,
        min: MIN_POOL_SIZE,
      });
    }

    Ok(())
  }
}
