use std::ptr::{self, NonNull};

use tracing::Span;

use crate::{
  align::POOL_ALIGNMENT,
  block::Block,
  cleanup::Cleanup,
  config::PoolConfig,
  error::{PoolError, Result},
  large::Large,
  provider::{RawMemory, System},
};

/// A region allocator: many cheap allocations, one release.
///
/// Small requests are bumped out of a chain of equally sized blocks. Larger
/// ones go straight to the provider and are tracked so they can be freed
/// early with [`Pool::release`]. Dropping the pool runs registered cleanups,
/// then frees everything.
///
/// # Thread Safety
///
/// A pool is neither `Send` nor `Sync`. Use one pool per request.
///
/// # Example
///
/// ```rust
/// use rpool::Pool;
///
/// let mut pool = Pool::create(4096).unwrap();
///
/// let header = pool.alloc(64).unwrap();
/// let body = pool.alloc(16 * 1024).unwrap(); // large
///
/// unsafe { header.as_ptr().write_bytes(0, 64) };
/// # let _ = body;
///
/// pool.reset(); // `header` and `body` are now dangling
/// ```
pub struct Pool<P: RawMemory = System> {
  pub(crate) config: PoolConfig,
  pub(crate) max_small: usize,
  /// Never empty; the first block lives as long as the pool.
  pub(crate) blocks: Vec<Block>,
  /// First block worth probing.
  pub(crate) current: usize,
  pub(crate) large: Vec<Large>,
  pub(crate) cleanups: Vec<Cleanup>,
  pub(crate) provider: P,
  pub(crate) span: Span,
}

impl Pool<System> {
  /// Creates a pool of `size`-byte blocks backed by the C heap.
  pub fn create(size: usize) -> Result<Self> {
    Self::with_config(PoolConfig::new(size))
  }

  pub fn with_config(config: PoolConfig) -> Result<Self> {
    Self::with_provider(config, System)
  }
}

impl<P: RawMemory> Pool<P> {
  pub fn with_provider(
    config: PoolConfig,
    provider: P,
  ) -> Result<Self> {
    config.validate()?;

    let span = tracing::debug_span!("pool", size = config.size);

    let start = provider
      .allocate_aligned(config.size, POOL_ALIGNMENT)
      .ok_or(PoolError::AllocationFailed {
        size: config.size,
        align: POOL_ALIGNMENT,
      })?;

    span.in_scope(|| tracing::debug!(ptr = ?start, "create pool"));

    Ok(Self {
      max_small: config.max_small_size(),
      blocks: vec![Block::new(start, config.size)],
      current: 0,
      large: Vec::new(),
      cleanups: Vec::new(),
      config,
      provider,
      span,
    })
  }

  /// Replaces the span diagnostics are emitted under.
  pub fn with_span(
    mut self,
    span: Span,
  ) -> Self {
    self.span = span;
    self
  }

  pub fn config(&self) -> &PoolConfig {
    &self.config
  }

  /// Largest request served from the blocks.
  pub fn max_small_size(&self) -> usize {
    self.max_small
  }

  pub fn provider(&self) -> &P {
    &self.provider
  }

  /// Allocates `size` word-aligned bytes.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if size <= self.max_small {
      return self.alloc_small(size, true);
    }

    self.alloc_large(size)
  }

  /// Allocates `size` bytes with no alignment, for strings and buffers.
  pub fn alloc_unaligned(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if size <= self.max_small {
      return self.alloc_small(size, false);
    }

    self.alloc_large(size)
  }

  /// Like [`Pool::alloc`], with the memory zero-filled.
  pub fn alloc_zeroed(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let ptr = self.alloc(size)?;
    unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
    Ok(ptr)
  }

  /// Frees large allocations and rewinds every block for reuse.
  ///
  /// Cleanup handlers are dropped without running. Every pointer handed out
  /// before the reset is invalid afterwards.
  pub fn reset(&mut self) {
    let span = self.span.clone();
    let _enter = span.enter();

    self.release_large();
    self.large.clear();
    self.cleanups.clear();

    for block in &mut self.blocks {
      block.rewind();
    }
    self.current = 0;

    tracing::debug!(blocks = self.blocks.len(), "reset pool");
  }

  /// Runs cleanups and frees all memory. Same as dropping the pool.
  pub fn destroy(self) {
    drop(self);
  }
}

impl<P: RawMemory> Drop for Pool<P> {
  fn drop(&mut self) {
    let span = self.span.clone();
    let _enter = span.enter();

    self.run_cleanups();
    self.release_large();

    for block in &self.blocks {
      tracing::debug!(ptr = ?block.start(), unused = block.unused(), "free");
      unsafe { self.provider.release(block.start()) };
    }
  }
}
