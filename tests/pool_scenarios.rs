use std::{
  cell::RefCell,
  fs::File,
  io::Read,
  os::fd::{FromRawFd, IntoRawFd, RawFd},
  rc::Rc,
};

use rpool::{
  CleanupHandler, FileCleanup, Pool, PoolConfig, PoolError, Released, Tracked, align::ALIGNMENT,
};

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

fn pipe() -> (File, RawFd) {
  let mut fds = [0 as RawFd; 2];
  assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
  (unsafe { File::from_raw_fd(fds[0]) }, fds[1])
}

#[test]
fn test_small_requests_grow_the_chain() {
  init_tracing();

  let provider = Tracked::system();
  let stats = provider.stats();
  let mut pool = Pool::with_provider(PoolConfig::new(4096), provider).unwrap();

  let mut previous: Option<usize> = None;
  for _ in 0..200 {
    let ptr = pool.alloc(100).unwrap();
    unsafe { ptr.as_ptr().write_bytes(0xAB, 100) };

    if let Some(prev) = previous {
      assert_ne!(prev, ptr.as_ptr() as usize);
    }
    previous = Some(ptr.as_ptr() as usize);
  }

  let snapshot = pool.stats();
  assert!(snapshot.blocks >= 5);
  assert_eq!(snapshot.capacity, snapshot.blocks * 4096);
  assert_eq!(snapshot.large_records, 0);
  assert_eq!(stats.allocations(), snapshot.blocks);

  drop(pool);
  assert_eq!(stats.outstanding(), 0);
}

#[test]
fn test_large_slot_reuse_keeps_registry_length() {
  init_tracing();

  let mut pool = Pool::create(4096).unwrap();

  let first = pool.alloc(10000).unwrap();
  let records = pool.stats().large_records;
  assert_eq!(pool.release(first), Released::Found);

  let second = pool.alloc(10000).unwrap();
  assert_eq!(pool.stats().large_records, records);

  assert_eq!(pool.release(second), Released::Found);
  assert_eq!(pool.release(second), Released::NotFound);
}

#[test]
fn test_destroy_runs_handlers_in_reverse_order_once() {
  init_tracing();

  let calls = Rc::new(RefCell::new(Vec::new()));
  let mut pool = Pool::create(1024).unwrap();

  for name in ["h1", "h2"] {
    let calls = Rc::clone(&calls);
    pool
      .register_cleanup(0)
      .unwrap()
      .on_cleanup(move |_| calls.borrow_mut().push(name));
  }

  pool.destroy();
  assert_eq!(*calls.borrow(), vec!["h2", "h1"]);
}

#[test]
fn test_reset_matches_a_fresh_pool() {
  let mut fresh = Pool::create(2048).unwrap();
  let mut reused = Pool::create(2048).unwrap();

  for _ in 0..50 {
    reused.alloc_unaligned(77).unwrap();
  }
  reused.alloc(50_000).unwrap();
  reused.reset();

  let a = fresh.alloc(32).unwrap().as_ptr() as usize;
  let b = fresh.alloc(32).unwrap().as_ptr() as usize;
  let c = reused.alloc(32).unwrap().as_ptr() as usize;
  let d = reused.alloc(32).unwrap().as_ptr() as usize;

  assert_eq!(b - a, d - c);
  assert_eq!(reused.stats().used, fresh.stats().used);
}

#[test]
fn test_run_file_cleanup_closes_once() {
  init_tracing();

  let (mut reader, writer) = pipe();
  let mut pool = Pool::create(1024).unwrap();
  pool.register_file(FileCleanup::new(writer, "pipe")).unwrap();

  assert!(pool.run_file_cleanup(writer));

  // Every write end is closed, so the read sees end of file.
  let mut buf = Vec::new();
  assert_eq!(reader.read_to_end(&mut buf).unwrap(), 0);

  assert!(!pool.run_file_cleanup(writer));
  assert_eq!(pool.stats().cleanups, 1);
}

#[test]
fn test_destroy_closes_registered_files() {
  let (mut reader, writer) = pipe();
  let mut pool = Pool::create(1024).unwrap();
  pool
    .register_cleanup(0)
    .unwrap()
    .set_handler(CleanupHandler::CloseFile(FileCleanup::new(writer, "pipe")));

  drop(pool);

  let mut buf = Vec::new();
  assert_eq!(reader.read_to_end(&mut buf).unwrap(), 0);
}

#[test]
fn test_delete_file_handler_removes_the_file() {
  init_tracing();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("upload.tmp");
  let fd = File::create(&path).unwrap().into_raw_fd();

  let mut pool = Pool::create(1024).unwrap();
  pool
    .register_cleanup(0)
    .unwrap()
    .set_handler(CleanupHandler::DeleteFile(FileCleanup::new(fd, &path)));

  assert!(path.exists());
  drop(pool);
  assert!(!path.exists());
}

#[test]
fn test_delete_file_handler_tolerates_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("gone.tmp");
  let fd = File::create(&path).unwrap().into_raw_fd();
  std::fs::remove_file(&path).unwrap();

  let ran = Rc::new(RefCell::new(false));
  let mut pool = Pool::create(1024).unwrap();

  let flag = Rc::clone(&ran);
  pool.register_cleanup(0).unwrap().on_cleanup(move |_| *flag.borrow_mut() = true);
  pool
    .register_cleanup(0)
    .unwrap()
    .set_handler(CleanupHandler::DeleteFile(FileCleanup::new(fd, &path)));

  drop(pool);
  assert!(*ran.borrow());
}

#[test]
fn test_provider_failure_is_not_fatal() {
  let provider = Tracked::system().with_limit(2);
  let stats = provider.stats();
  let mut pool = Pool::with_provider(PoolConfig::new(1024), provider).unwrap();

  let large = pool.alloc(5000).unwrap();
  assert_eq!(
    pool.alloc(5000),
    Err(PoolError::AllocationFailed { size: 5000, align: 1 })
  );

  // Small requests still fit the first block.
  assert!(pool.alloc(512).is_ok());

  assert_eq!(pool.release(large), Released::Found);
  drop(pool);
  assert_eq!(stats.outstanding(), 0);
}

mod properties {
  use proptest::prelude::*;

  use super::*;

  fn overlaps(regions: &mut [(usize, usize)]) -> bool {
    regions.sort_unstable();
    regions.windows(2).any(|w| w[0].0 + w[0].1 > w[1].0)
  }

  proptest! {
    #[test]
    fn consecutive_small_allocations_are_ordered(size in 0usize..=1000) {
      let mut pool = Pool::create(4096).unwrap();

      let a = pool.alloc(size).unwrap().as_ptr() as usize;
      let b = pool.alloc(size).unwrap().as_ptr() as usize;

      prop_assert!(b >= a + size);
    }

    #[test]
    fn allocations_never_overlap(
      requests in prop::collection::vec((1usize..6000, any::<bool>()), 1..200),
    ) {
      let mut pool = Pool::create(4096).unwrap();
      let mut regions = Vec::new();

      for (size, aligned) in requests {
        let ptr = if aligned {
          pool.alloc(size).unwrap()
        } else {
          pool.alloc_unaligned(size).unwrap()
        };

        if aligned {
          prop_assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);
        }
        regions.push((ptr.as_ptr() as usize, size));
      }

      prop_assert!(!overlaps(&mut regions));
    }

    #[test]
    fn release_finds_each_large_pointer_once(
      sizes in prop::collection::vec(4096usize..20000, 1..20),
    ) {
      let mut pool = Pool::create(4096).unwrap();
      let ptrs: Vec<_> = sizes.iter().map(|&size| pool.alloc(size).unwrap()).collect();

      for ptr in &ptrs {
        prop_assert_eq!(pool.release(*ptr), Released::Found);
      }
      for ptr in &ptrs {
        prop_assert_eq!(pool.release(*ptr), Released::NotFound);
      }
      prop_assert_eq!(pool.stats().live_large, 0);
    }
  }
}
