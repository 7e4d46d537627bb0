use thiserror::Error;

/// Failures reported by a [`Pool`](crate::Pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
  /// The raw memory provider could not satisfy the request.
  #[error("allocation of {size} bytes (align {align}) failed")]
  AllocationFailed { size: usize, align: usize },

  /// The pool size is too small to be useful.
  #[error("pool size {size} is below the minimum of {min} bytes")]
  InvalidSize { size: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// Outcome of [`Pool::release`](crate::Pool::release).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Released {
  /// The pointer was a live large allocation and has been freed.
  Found,
  /// The pointer is not tracked by the large registry.
  NotFound,
}
