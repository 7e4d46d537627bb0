use std::ptr::NonNull;

use crate::{
  align::POOL_ALIGNMENT,
  block::Block,
  error::{PoolError, Result},
  pool::Pool,
  provider::RawMemory,
};

impl<P: RawMemory> Pool<P> {
  /// Bump-allocates `size` bytes, growing the chain when no block has room.
  ///
  /// Callers route anything above `max_small_size` to the large path.
  pub(crate) fn alloc_small(
    &mut self,
    size: usize,
    align: bool,
  ) -> Result<NonNull<u8>> {
    debug_assert!(size <= self.max_small);

    for block in &mut self.blocks[self.current..] {
      if let Some(ptr) = block.try_bump(size, align) {
        return Ok(ptr);
      }
    }

    self.alloc_block(size)
  }

  /// Appends a block of the pool's own size and serves `size` from it.
  fn alloc_block(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let block_size = self.config.size;

    let start = self
      .provider
      .allocate_aligned(block_size, POOL_ALIGNMENT)
      .ok_or(PoolError::AllocationFailed {
        size: block_size,
        align: POOL_ALIGNMENT,
      })?;

    let mut block = Block::new(start, block_size);

    let Some(ptr) = block.try_bump(size, true) else {
      unsafe { self.provider.release(start) };
      return Err(PoolError::AllocationFailed {
        size,
        align: POOL_ALIGNMENT,
      });
    };

    let tail = self.blocks.len() - 1;
    for index in self.current..tail {
      let block = &mut self.blocks[index];

      if block.failed > self.config.failed_threshold {
        self.current = index + 1;
      }
      block.failed += 1;
    }

    self.blocks.push(block);

    tracing::trace!(
      blocks = self.blocks.len(),
      current = self.current,
      "pool grew"
    );

    Ok(ptr)
  }
}
