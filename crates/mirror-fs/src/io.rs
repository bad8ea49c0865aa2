//! Atomic copy and replica-side filesystem operations

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, Result};

const COPY_BUFFER: usize = 64 * 1024;

/// Retry policy for transient I/O failures.
///
/// Only interruptions, would-block and timeouts are retried; permission or
/// not-found errors fail on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Delay before the first retry
    pub retry_initial: Duration,
    /// Give up once this much time has passed. Zero disables retries.
    pub retry_max_elapsed: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            retry_initial: Duration::from_millis(50),
            retry_max_elapsed: Duration::from_secs(2),
        }
    }
}

impl RobustnessConfig {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            retry_initial: Duration::ZERO,
            retry_max_elapsed: Duration::ZERO,
        }
    }

    /// Run `op`, retrying it with exponential backoff while it fails transiently.
    pub fn retry<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        if self.retry_max_elapsed.is_zero() {
            return op();
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry_initial)
            .with_max_elapsed_time(Some(self.retry_max_elapsed))
            .build();

        backoff::retry(policy, || {
            op().map_err(|e| {
                if is_transient(&e) {
                    tracing::debug!(error = %e, "Transient I/O failure, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

fn is_transient(error: &Error) -> bool {
    match error {
        Error::Io { source, .. } | Error::Read { source, .. } | Error::Write { source, .. } => {
            matches!(
                source.kind(),
                ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
            )
        }
        Error::LockFailed { .. } => true,
        _ => false,
    }
}

/// Temp file next to `target`, so the final rename stays on one filesystem.
fn temp_sibling(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    target.with_file_name(temp_name)
}

/// Copy `src` over `dst` atomically.
///
/// Content is written to a temporary sibling of `dst` under an exclusive
/// advisory lock, flushed, stamped with the source modification time and
/// permissions, then renamed into place. On failure the temp file is removed
/// and `dst` keeps its previous content.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// [`Error::Read`] if `src` cannot be opened or read, [`Error::Write`] if the
/// temp file cannot be written or renamed.
pub fn copy_atomic(src: &Path, dst: &Path, robustness: RobustnessConfig) -> Result<u64> {
    robustness.retry(|| copy_once(src, dst))
}

fn copy_once(src: &Path, dst: &Path) -> Result<u64> {
    let mut source = File::open(src).map_err(|e| Error::read(src, e))?;
    let metadata = source.metadata().map_err(|e| Error::read(src, e))?;
    let temp_path = temp_sibling(dst);

    let copied = match write_temp(&mut source, &metadata, src, &temp_path) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    if let Err(e) = fs::rename(&temp_path, dst) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::write(dst, e));
    }

    Ok(copied)
}

fn write_temp(
    source: &mut File,
    metadata: &Metadata,
    src: &Path,
    temp_path: &Path,
) -> Result<u64> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::write(temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: temp_path.to_path_buf(),
    })?;

    let mut buf = vec![0u8; COPY_BUFFER];
    let mut copied = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read(src, e)),
        };
        temp_file
            .write_all(&buf[..n])
            .map_err(|e| Error::write(temp_path, e))?;
        copied += n as u64;
    }

    temp_file
        .sync_all()
        .map_err(|e| Error::write(temp_path, e))?;

    // Not every platform reports a modification time; content is what matters.
    if let Ok(modified) = metadata.modified() {
        temp_file
            .set_modified(modified)
            .map_err(|e| Error::write(temp_path, e))?;
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: temp_path.to_path_buf(),
    })?;
    drop(temp_file);

    fs::set_permissions(temp_path, metadata.permissions())
        .map_err(|e| Error::write(temp_path, e))?;

    Ok(copied)
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Create a replica directory and any missing ancestors.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::write(path, e))
}

/// Remove a single replica file.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::write(path, e))
}

/// Remove a replica directory together with everything under it.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|e| Error::write(path, e))
}

/// Metadata of a source entry, following symlinks.
pub fn source_metadata(path: &Path) -> Result<Metadata> {
    fs::metadata(path).map_err(|e| Error::read(path, e))
}
