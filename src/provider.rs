//! Raw memory providers.
//!
//! A [`Pool`](crate::Pool) never talks to the system allocator directly; it
//! asks a [`RawMemory`] for blocks and hands them back at reset or teardown.

use std::{cell::Cell, mem, ptr::NonNull, rc::Rc};

use libc::c_void;

/// Source of raw memory blocks for a pool.
pub trait RawMemory {
  /// Returns `size` bytes with at least word alignment, or `None`.
  fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>>;

  /// Returns `size` bytes aligned to `alignment`, or `None`.
  fn allocate_aligned(
    &self,
    size: usize,
    alignment: usize,
  ) -> Option<NonNull<u8>>;

  /// Gives a block back.
  ///
  /// # Safety
  ///
  /// `ptr` must come from this provider and must not be released twice.
  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
  );
}

/// The C heap: `malloc`, `posix_memalign` and `free`.
#[derive(Debug, Default, Clone, Copy)]
pub struct System;

impl RawMemory for System {
  fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let ptr = unsafe { libc::malloc(size.max(1)) };

    let block = NonNull::new(ptr as *mut u8);
    if block.is_none() {
      tracing::error!(size, "malloc failed");
    }

    block
  }

  fn allocate_aligned(
    &self,
    size: usize,
    alignment: usize,
  ) -> Option<NonNull<u8>> {
    if !alignment.is_power_of_two() {
      tracing::error!(size, alignment, "alignment is not a power of two");
      return None;
    }

    // posix_memalign wants a multiple of the pointer size.
    let alignment = alignment.max(mem::size_of::<*mut c_void>());
    let mut ptr: *mut c_void = std::ptr::null_mut();

    let err = unsafe { libc::posix_memalign(&mut ptr, alignment, size.max(1)) };
    if err != 0 {
      tracing::error!(size, alignment, errno = err, "posix_memalign failed");
      return None;
    }

    NonNull::new(ptr as *mut u8)
  }

  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
  ) {
    unsafe { libc::free(ptr.as_ptr() as *mut c_void) };
  }
}

/// Counters shared between a [`Tracked`] provider and whoever observes it.
#[derive(Debug, Default)]
pub struct ProviderStats {
  allocations: Cell<usize>,
  releases: Cell<usize>,
  failures: Cell<usize>,
}

impl ProviderStats {
  /// Successful allocations so far.
  pub fn allocations(&self) -> usize {
    self.allocations.get()
  }

  pub fn releases(&self) -> usize {
    self.releases.get()
  }

  /// Requests refused, either by the inner provider or by the limit.
  pub fn failures(&self) -> usize {
    self.failures.get()
  }

  /// Blocks handed out and not yet given back.
  pub fn outstanding(&self) -> usize {
    self.allocations() - self.releases()
  }
}

/// Wraps a provider, counting its traffic and optionally capping it.
///
/// ```rust
/// use rpool::{Pool, PoolConfig, Tracked};
///
/// let provider = Tracked::system();
/// let stats = provider.stats();
///
/// let pool = Pool::with_provider(PoolConfig::new(1024), provider).unwrap();
/// assert_eq!(stats.allocations(), 1);
///
/// drop(pool);
/// assert_eq!(stats.outstanding(), 0);
/// ```
#[derive(Debug)]
pub struct Tracked<P = System> {
  inner: P,
  stats: Rc<ProviderStats>,
  limit: Option<usize>,
}

impl Tracked<System> {
  pub fn system() -> Self {
    Self::new(System)
  }
}

impl<P: RawMemory> Tracked<P> {
  pub fn new(inner: P) -> Self {
    Self {
      inner,
      stats: Rc::default(),
      limit: None,
    }
  }

  /// Refuses every allocation once `limit` have succeeded.
  pub fn with_limit(
    mut self,
    limit: usize,
  ) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn stats(&self) -> Rc<ProviderStats> {
    Rc::clone(&self.stats)
  }

  fn record(
    &self,
    block: Option<NonNull<u8>>,
  ) -> Option<NonNull<u8>> {
    match block {
      Some(_) => self.stats.allocations.set(self.stats.allocations() + 1),
      None => self.stats.failures.set(self.stats.failures() + 1),
    }
    block
  }

  fn exhausted(&self) -> bool {
    let exhausted = self.limit.is_some_and(|limit| self.stats.allocations() >= limit);
    if exhausted {
      self.stats.failures.set(self.stats.failures() + 1);
    }
    exhausted
  }
}

impl<P: RawMemory> RawMemory for Tracked<P> {
  fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if self.exhausted() {
      return None;
    }
    self.record(self.inner.allocate(size))
  }

  fn allocate_aligned(
    &self,
    size: usize,
    alignment: usize,
  ) -> Option<NonNull<u8>> {
    if self.exhausted() {
      return None;
    }
    self.record(self.inner.allocate_aligned(size, alignment))
  }

  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
  ) {
    self.stats.releases.set(self.stats.releases() + 1);
    unsafe { self.inner.release(ptr) };
  }
}
