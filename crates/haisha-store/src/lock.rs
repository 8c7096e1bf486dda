//! Exclusive write lock for a ledger directory
//!
//! The lock file is created with `create_new` and held under an OS advisory
//! lock for as long as the store lives. It records its owner, so a lock left
//! behind by a crashed run can be recognized and cleared by the next opener.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use haisha_types::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Create attempts before giving up; the second one follows a stale-lock cleanup
const MAX_ATTEMPTS: usize = 2;

/// Owner record stored in the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LockOwner {
    pub pid: u32,
    pub host: String,
    pub started_at: DateTime<Utc>,
}

impl LockOwner {
    pub(crate) fn current() -> Self {
        Self {
            pid: std::process::id(),
            host: current_host(),
            started_at: Utc::now(),
        }
    }

    /// The owning process is gone. Only decidable on the owner's host.
    pub(crate) fn is_stale(&self) -> bool {
        self.host == current_host() && !is_process_running(self.pid)
    }
}

impl fmt::Display for LockOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid {} on {} since {}",
            self.pid,
            self.host,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

fn current_host() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // Signal 0 only checks existence; EPERM means it runs under another user
    (unsafe { libc::kill(pid, 0) == 0 })
        || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn is_process_running(_pid: u32) -> bool {
    // Left to the OS lock check in `inspect`
    true
}

/// What an existing lock file turned out to be
enum Holder {
    /// Cleared; the caller may create the lock again
    Gone,
    Live(Option<LockOwner>),
}

/// Lock file plus the OS lock on its handle; both released on drop
#[derive(Debug)]
pub(crate) struct LedgerLock {
    file: File,
    path: PathBuf,
}

impl LedgerLock {
    pub(crate) fn acquire(path: &Path) -> Result<Self> {
        let mut holder = None;
        for _ in 0..MAX_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(file) => return Self::take(file, path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => match inspect(path)? {
                    Holder::Gone => continue,
                    Holder::Live(owner) => {
                        holder = owner;
                        break;
                    }
                },
                Err(e) => {
                    return Err(Error::LedgerWriteConflict(format!(
                        "cannot create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Err(conflict(path, holder.as_ref()))
    }

    fn take(file: File, path: &Path) -> Result<Self> {
        if let Err(e) = file.try_lock_exclusive() {
            // A contended file is being cleared by another opener, which removes it
            if e.raw_os_error() != fs2::lock_contended_error().raw_os_error() {
                if let Err(remove_err) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %remove_err, "failed to remove unlockable ledger lock");
                }
            }
            return Err(Error::LedgerWriteConflict(format!(
                "{}: {}",
                path.display(),
                e
            )));
        }

        let lock = Self {
            file,
            path: path.to_path_buf(),
        };
        lock.write_owner(&LockOwner::current())?;
        Ok(lock)
    }

    fn write_owner(&self, owner: &LockOwner) -> Result<()> {
        let mut file = &self.file;
        serde_json::to_writer(&mut file, owner)?;
        file.sync_all()?;
        Ok(())
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        // Removed while still locked; the OS lock goes with the handle
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release ledger lock");
        }
    }
}

fn read_owner(path: &Path) -> Option<LockOwner> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Decide whether an existing lock file still has a live owner, clearing it if not
fn inspect(path: &Path) -> Result<Holder> {
    let owner = read_owner(path);
    let checker = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Holder::Gone),
        Err(e) => return Err(e.into()),
    };

    let unlocked = checker.try_lock_exclusive().is_ok();
    let dead_owner = owner.as_ref().is_some_and(LockOwner::is_stale);
    if !unlocked && !dead_owner {
        return Ok(Holder::Live(owner));
    }

    match owner {
        Some(ref owner) => warn!(
            path = %path.display(),
            pid = owner.pid,
            host = %owner.host,
            "removing stale ledger lock"
        ),
        None => warn!(path = %path.display(), "removing ledger lock with no live owner"),
    }
    // `checker` still holds the OS lock here
    match fs::remove_file(path) {
        Ok(()) => Ok(Holder::Gone),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Holder::Gone),
        Err(e) => Err(e.into()),
    }
}

fn conflict(path: &Path, owner: Option<&LockOwner>) -> Error {
    match owner {
        Some(owner) => Error::LedgerWriteConflict(format!(
            "{} is held by {}",
            path.display(),
            owner
        )),
        None => Error::LedgerWriteConflict(format!(
            "{} exists; another run holds this ledger",
            path.display()
        )),
    }
}
