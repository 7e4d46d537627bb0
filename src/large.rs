use std::ptr::NonNull;

use crate::{
  error::{PoolError, Released, Result},
  pool::Pool,
  provider::RawMemory,
};

/// Tracks one allocation too big for the blocks.
///
/// A released record keeps its place in the registry with `alloc` cleared
/// so that a later large allocation can take the slot.
#[derive(Debug)]
pub(crate) struct Large {
  pub(crate) alloc: Option<NonNull<u8>>,
}

impl<P: RawMemory> Pool<P> {
  pub(crate) fn alloc_large(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let ptr = self
      .provider
      .allocate(size)
      .ok_or(PoolError::AllocationFailed { size, align: 1 })?;

    // Newest records sit at the back.
    let scan = self.config.large_reuse_scan;
    if let Some(slot) = self
      .large
      .iter_mut()
      .rev()
      .take(scan)
      .find(|large| large.alloc.is_none())
    {
      slot.alloc = Some(ptr);
      return Ok(ptr);
    }

    self.track_large(ptr, size, 1)
  }

  /// Allocates `size` bytes aligned to `alignment`, always tracked as large.
  pub fn alloc_aligned(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>> {
    let ptr = self
      .provider
      .allocate_aligned(size, alignment)
      .ok_or(PoolError::AllocationFailed {
        size,
        align: alignment,
      })?;

    self.track_large(ptr, size, alignment)
  }

  fn track_large(
    &mut self,
    ptr: NonNull<u8>,
    size: usize,
    align: usize,
  ) -> Result<NonNull<u8>> {
    if self.large.try_reserve(1).is_err() {
      unsafe { self.provider.release(ptr) };
      return Err(PoolError::AllocationFailed { size, align });
    }

    self.large.push(Large { alloc: Some(ptr) });
    Ok(ptr)
  }

  /// Frees a large allocation ahead of reset or teardown.
  ///
  /// Pointers from the bump path are never tracked and report
  /// [`Released::NotFound`].
  pub fn release(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Released {
    let Some(large) = self
      .large
      .iter_mut()
      .rev()
      .find(|large| large.alloc == Some(ptr))
    else {
      return Released::NotFound;
    };

    let _enter = self.span.enter();
    tracing::debug!(ptr = ?ptr, "free");

    large.alloc = None;
    unsafe { self.provider.release(ptr) };

    Released::Found
  }

  /// Gives every live large payload back to the provider.
  pub(crate) fn release_large(&mut self) {
    for large in &mut self.large {
      if let Some(ptr) = large.alloc.take() {
        tracing::debug!(ptr = ?ptr, "free");
        unsafe { self.provider.release(ptr) };
      }
    }
  }
}
