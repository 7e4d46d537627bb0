use std::ptr::NonNull;

use crate::align::{ALIGNMENT, align_ptr};

/// One fixed-size region of the chain, carved from the front by a cursor.
///
/// ```text
///   start                 last                              end
///     ┌─────┬───┬─────────┬─────────────────────────────────┐
///     │ A1  │pad│   A2    │            free                 │
///     └─────┴───┴─────────┴─────────────────────────────────┘
/// ```
#[derive(Debug)]
pub(crate) struct Block {
  start: NonNull<u8>,
  /// Next free byte; never past `end`.
  last: *mut u8,
  end: *mut u8,
  /// Requests this block could not serve while it was probed.
  pub(crate) failed: usize,
}

impl Block {
  pub(crate) fn new(
    start: NonNull<u8>,
    size: usize,
  ) -> Self {
    Self {
      start,
      last: start.as_ptr(),
      end: start.as_ptr().wrapping_add(size),
      failed: 0,
    }
  }

  /// Claims `size` bytes at the cursor, word aligned when `align` is set.
  pub(crate) fn try_bump(
    &mut self,
    size: usize,
    align: bool,
  ) -> Option<NonNull<u8>> {
    let mut m = self.last;

    if align {
      m = align_ptr(m, ALIGNMENT);
    }

    // Padding can carry `m` past `end` on blocks that are not word sized.
    let room = (self.end as usize).checked_sub(m as usize)?;
    if room < size {
      return None;
    }

    self.last = m.wrapping_add(size);
    NonNull::new(m)
  }

  pub(crate) fn rewind(&mut self) {
    self.last = self.start.as_ptr();
    self.failed = 0;
  }

  pub(crate) fn start(&self) -> NonNull<u8> {
    self.start
  }

  pub(crate) fn capacity(&self) -> usize {
    self.end as usize - self.start.as_ptr() as usize
  }

  pub(crate) fn used(&self) -> usize {
    self.last as usize - self.start.as_ptr() as usize
  }

  pub(crate) fn unused(&self) -> usize {
    self.end as usize - self.last as usize
  }
}
