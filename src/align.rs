/// Alignment of aligned small allocations: the machine word.
pub const ALIGNMENT: usize = ::core::mem::size_of::<usize>();

/// Alignment of every block requested from the provider.
pub const POOL_ALIGNMENT: usize = 16;

/// Rounds `value` up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use rpool::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to `alignment`, which must be a power of two.
///
/// ```rust
/// use rpool::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + $alignment - 1) & !($alignment - 1)
  };
}

/// Rounds an address up to `alignment`, keeping the pointer's provenance.
#[inline]
pub(crate) fn align_ptr(
  ptr: *mut u8,
  alignment: usize,
) -> *mut u8 {
  let addr = ptr as usize;
  ptr.wrapping_add(align_to!(addr, alignment) - addr)
}
