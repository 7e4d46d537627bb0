//! # rpool - A Region Pool Allocator
//!
//! This crate provides a **region allocator**: a pool is created once, serves
//! many small allocations by bumping a cursor, and gives everything back at
//! once when it is reset or dropped.
//!
//! ## Overview
//!
//! ```text
//!   Pool Layout:
//!
//!   ┌────────────── Pool ──────────────┐
//!   │ blocks  current  large  cleanups │
//!   └────┬───────┬───────┬───────┬─────┘
//!        │       │       │       │
//!        ▼       ▼       │       │
//!   ┌─────────┬─────────┬┴────────┐     every block has the pool's size
//!   │ block 0 │ block 1 │ block 2 │ ◄── current: first block worth probing
//!   └─────────┴─────────┴─────────┘
//!                        │       │
//!                        ▼       ▼
//!                  ┌──────────┐ ┌──────────────────┐
//!                  │ 10000 B  │ │ close / FnOnce   │ run newest first
//!                  │ (malloc) │ └──────────────────┘ on drop
//!                  └──────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - One block of the chain and its cursor (internal)
//!   ├── bump       - Small allocations and chain growth (internal)
//!   ├── large      - Large allocations, early release
//!   ├── cleanup    - Deferred handlers, file cleanups
//!   ├── config     - PoolConfig and its limits
//!   ├── provider   - RawMemory, System, Tracked
//!   ├── stats      - PoolStats
//!   └── pool       - Pool: create, alloc, reset, drop
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::{Pool, Released};
//!
//! let mut pool = Pool::create(4096).unwrap();
//!
//! // Bumped out of the first block.
//! let small = pool.alloc(100).unwrap();
//!
//! // Too big for a block: tracked separately, can be freed early.
//! let large = pool.alloc(10_000).unwrap();
//! assert_eq!(pool.release(large), Released::Found);
//!
//! unsafe { small.as_ptr().write_bytes(0, 100) };
//!
//! // Rewind for the next request; blocks are kept.
//! pool.reset();
//! ```
//!
//! ## How It Works
//!
//! Requests up to [`Pool::max_small_size`] are served from blocks:
//!
//! ```text
//!   alloc(size):
//!
//!   for block in blocks[current..]:
//!       m = align(block.last)            (skipped by alloc_unaligned)
//!       if block.end - m >= size:
//!           block.last = m + size
//!           return m
//!
//!   new block of pool size, serve from it, append to chain
//!   every block walked past takes a miss; a miss after 4 moves `current`
//! ```
//!
//! Larger requests go to the [`RawMemory`] provider directly. Their records
//! stay in the pool after [`Pool::release`] and are refilled by later large
//! allocations, so the registry does not grow without bound.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: a pool is neither `Send` nor `Sync`
//! - **No individual free**: small allocations live until reset or drop
//! - **Unix-only**: requires `libc` (`malloc`, `posix_memalign`, `close`)
//!
//! ## Safety
//!
//! Allocation is safe; the returned pointers are raw. Dereferencing one after
//! [`Pool::reset`] or after the pool is dropped is undefined behavior.

pub mod align;
mod block;
mod bump;
mod cleanup;
mod config;
mod error;
mod large;
mod pool;
mod provider;
mod stats;

pub use cleanup::{Cleanup, CleanupHandler, FileCleanup};
pub use config::{DEFAULT_POOL_SIZE, MAX_SMALL_ALLOC, MIN_POOL_SIZE, PoolConfig};
pub use error::{PoolError, Released, Result};
pub use pool::Pool;
pub use provider::{ProviderStats, RawMemory, System, Tracked};
pub use stats::PoolStats;
