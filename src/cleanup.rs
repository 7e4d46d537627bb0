//! Deferred actions run when a pool is torn down.

use std::{fmt, fs, io, os::fd::RawFd, path::PathBuf, ptr::NonNull};

use crate::{error::Result, pool::Pool, provider::RawMemory};

/// A file descriptor owned by the pool, with the name it was opened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCleanup {
  pub fd: RawFd,
  pub name: PathBuf,
}

impl FileCleanup {
  pub fn new(
    fd: RawFd,
    name: impl Into<PathBuf>,
  ) -> Self {
    Self {
      fd,
      name: name.into(),
    }
  }

  /// Closes the descriptor. Failures are logged, never returned.
  pub fn close(&self) {
    tracing::debug!(fd = self.fd, "file cleanup");
    self.close_fd();
  }

  /// Removes the file, then closes the descriptor.
  ///
  /// A file that is already gone is not worth reporting.
  pub fn delete(&self) {
    tracing::debug!(fd = self.fd, name = %self.name.display(), "file cleanup");

    if let Err(err) = fs::remove_file(&self.name) {
      if err.kind() != io::ErrorKind::NotFound {
        tracing::error!(
          name = %self.name.display(),
          error = %err,
          "unlink() failed"
        );
      }
    }

    self.close_fd();
  }

  fn close_fd(&self) {
    if unsafe { libc::close(self.fd) } == -1 {
      tracing::warn!(
        fd = self.fd,
        name = %self.name.display(),
        error = %io::Error::last_os_error(),
        "close() failed"
      );
    }
  }
}

/// What a cleanup record does when it runs.
pub enum CleanupHandler {
  /// Arbitrary teardown; receives the record's payload, if any.
  Callback(Box<dyn FnOnce(Option<NonNull<u8>>)>),
  /// Closes a file descriptor.
  CloseFile(FileCleanup),
  /// Deletes a file and closes its descriptor.
  DeleteFile(FileCleanup),
}

impl CleanupHandler {
  fn run(
    self,
    data: Option<NonNull<u8>>,
  ) {
    match self {
      Self::Callback(callback) => callback(data),
      Self::CloseFile(file) => file.close(),
      Self::DeleteFile(file) => file.delete(),
    }
  }
}

impl fmt::Debug for CleanupHandler {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Self::Callback(_) => f.write_str("Callback(..)"),
      Self::CloseFile(file) => f.debug_tuple("CloseFile").field(file).finish(),
      Self::DeleteFile(file) => f.debug_tuple("DeleteFile").field(file).finish(),
    }
  }
}

/// A registered cleanup. Returned by [`Pool::register_cleanup`].
///
/// The handler starts unset; a record without one does nothing.
#[derive(Debug)]
pub struct Cleanup {
  handler: Option<CleanupHandler>,
  data: Option<NonNull<u8>>,
  len: usize,
}

impl Cleanup {
  pub fn set_handler(
    &mut self,
    handler: CleanupHandler,
  ) -> &mut Self {
    self.handler = Some(handler);
    self
  }

  /// Shorthand for a [`CleanupHandler::Callback`].
  pub fn on_cleanup(
    &mut self,
    callback: impl FnOnce(Option<NonNull<u8>>) + 'static,
  ) -> &mut Self {
    self.set_handler(CleanupHandler::Callback(Box::new(callback)))
  }

  pub fn handler(&self) -> Option<&CleanupHandler> {
    self.handler.as_ref()
  }

  /// Pool memory reserved for the handler, valid until the pool is dropped.
  pub fn data(&self) -> Option<NonNull<u8>> {
    self.data
  }

  pub fn data_len(&self) -> usize {
    self.len
  }

  fn run(&mut self) {
    if let Some(handler) = self.handler.take() {
      tracing::debug!(handler = ?handler, "run cleanup");
      handler.run(self.data);
    }
  }

  fn closes(
    &self,
    fd: RawFd,
  ) -> bool {
    matches!(&self.handler, Some(CleanupHandler::CloseFile(file)) if file.fd == fd)
  }
}

impl<P: RawMemory> Pool<P> {
  /// Registers a cleanup with `size` bytes of payload taken from the pool.
  ///
  /// ```rust
  /// use rpool::Pool;
  ///
  /// let mut pool = Pool::create(4096).unwrap();
  /// pool.register_cleanup(0).unwrap().on_cleanup(|_| println!("bye"));
  /// ```
  pub fn register_cleanup(
    &mut self,
    size: usize,
  ) -> Result<&mut Cleanup> {
    let data = match size {
      0 => None,
      size => Some(self.alloc(size)?),
    };

    let _enter = self.span.enter();

    self.cleanups.push(Cleanup {
      handler: None,
      data,
      len: size,
    });
    tracing::debug!(records = self.cleanups.len(), "add cleanup");

    let index = self.cleanups.len() - 1;
    Ok(&mut self.cleanups[index])
  }

  /// Registers a handler that closes `fd` at teardown.
  pub fn register_file(
    &mut self,
    file: FileCleanup,
  ) -> Result<&mut Cleanup> {
    let cleanup = self.register_cleanup(0)?;
    cleanup.set_handler(CleanupHandler::CloseFile(file));
    Ok(cleanup)
  }

  /// Closes `fd` now if a [`CleanupHandler::CloseFile`] record owns it.
  ///
  /// The record is disarmed so teardown will not close it again. Returns
  /// whether a record matched.
  pub fn run_file_cleanup(
    &mut self,
    fd: RawFd,
  ) -> bool {
    let _enter = self.span.enter();

    match self.cleanups.iter_mut().rev().find(|c| c.closes(fd)) {
      Some(cleanup) => {
        cleanup.run();
        true
      },
      None => false,
    }
  }

  /// Runs every armed handler, newest first.
  pub(crate) fn run_cleanups(&mut self) {
    for cleanup in self.cleanups.iter_mut().rev() {
      cleanup.run();
    }
  }
}
