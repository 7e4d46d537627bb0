use crate::{pool::Pool, provider::RawMemory};

/// Point-in-time usage of a [`Pool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
  /// Blocks in the chain.
  pub blocks: usize,
  /// Bytes across all blocks.
  pub capacity: usize,
  /// Bytes claimed from blocks, alignment padding included.
  pub used: usize,
  /// Large records, released slots included.
  pub large_records: usize,
  /// Large records that still own an allocation.
  pub live_large: usize,
  pub cleanups: usize,
}

impl<P: RawMemory> Pool<P> {
  pub fn stats(&self) -> PoolStats {
    PoolStats {
      blocks: self.blocks.len(),
      capacity: self.blocks.iter().map(|b| b.capacity()).sum(),
      used: self.blocks.iter().map(|b| b.used()).sum(),
      large_records: self.large.len(),
      live_large: self.large.iter().filter(|l| l.alloc.is_some()).count(),
      cleanups: self.cleanups.len(),
    }
  }
}
