use std::{fs::File, os::fd::IntoRawFd, ptr};

use rpool::{CleanupHandler, FileCleanup, Pool, PoolConfig, Released, Tracked};

/// Prints the pool's usage after a step.
fn print_stats<P: rpool::RawMemory>(
  label: &str,
  pool: &Pool<P>,
) {
  let stats = pool.stats();
  println!(
    "[{}] blocks = {}, used = {}/{}, large = {} ({} live), cleanups = {}",
    label,
    stats.blocks,
    stats.used,
    stats.capacity,
    stats.large_records,
    stats.live_large,
    stats.cleanups,
  );
}

fn main() {
  // RUST_LOG=rpool=debug shows what the pool does under the hood.
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let provider = Tracked::system();
  let provider_stats = provider.stats();

  let Ok(mut pool) = Pool::with_provider(PoolConfig::new(4096), provider) else {
    eprintln!("could not create pool");
    return;
  };

  for request in 0..3 {
    println!("\n=== request {} ===", request);

    // --------------------------------------------------------------------
    // 1) A request line, copied byte for byte. No alignment needed.
    // --------------------------------------------------------------------
    let line = b"GET /index.html HTTP/1.1";
    let Ok(copy) = pool.alloc_unaligned(line.len()) else {
      return;
    };
    unsafe { ptr::copy_nonoverlapping(line.as_ptr(), copy.as_ptr(), line.len()) };
    println!("[1] request line at {:?}", copy);

    // --------------------------------------------------------------------
    // 2) Many small headers. The first block fills up and the pool grows.
    // --------------------------------------------------------------------
    for _ in 0..64 {
      if pool.alloc_zeroed(100).is_err() {
        return;
      }
    }
    print_stats("2", &pool);

    // --------------------------------------------------------------------
    // 3) A body too big for a block, released as soon as it is consumed.
    // --------------------------------------------------------------------
    let Ok(body) = pool.alloc(64 * 1024) else {
      return;
    };
    println!("[3] body at {:?}", body);
    assert_eq!(pool.release(body), Released::Found);
    print_stats("3", &pool);

    // --------------------------------------------------------------------
    // 4) A log file closed by the pool, early, before the request ends.
    // --------------------------------------------------------------------
    let path = std::env::temp_dir().join(format!("rpool-demo-{}-{}", std::process::id(), request));
    if let Ok(file) = File::create(&path) {
      let fd = file.into_raw_fd();
      if pool.register_file(FileCleanup::new(fd, &path)).is_ok() {
        println!("[4] closed fd {} early: {}", fd, pool.run_file_cleanup(fd));
      }
      let _ = std::fs::remove_file(&path);
    }

    // --------------------------------------------------------------------
    // 5) End of request: rewind. No new provider calls on the next one.
    // --------------------------------------------------------------------
    pool.reset();
    println!(
      "[5] reset; provider allocations so far = {}",
      provider_stats.allocations()
    );
  }

  // Reset drops cleanups without running them; drop runs them.
  let path = std::env::temp_dir().join(format!("rpool-demo-{}-final", std::process::id()));
  if let Ok(file) = File::create(&path) {
    if let Ok(cleanup) = pool.register_cleanup(0) {
      cleanup.set_handler(CleanupHandler::DeleteFile(FileCleanup::new(file.into_raw_fd(), &path)));
    }
  }

  drop(pool);
  println!(
    "\n[6] dropped; {} exists = {}, outstanding provider blocks = {}",
    path.display(),
    path.exists(),
    provider_stats.outstanding()
  );
}
