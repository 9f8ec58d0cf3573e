//! Lock files and the per-realm writer lock.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::{OdbError, Realm};

const LOCK_SUFFIX: &str = ".lock";
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// `<path>.lock`, created with `O_CREAT|O_EXCL`.
///
/// Content written to the guard replaces `<path>` atomically on
/// [`commit`](LockFile::commit). Dropping an uncommitted guard removes the
/// lock file and leaves `<path>` untouched.
pub struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl LockFile {
    /// Take the lock, or fail with [`OdbError::Locked`] if it is held.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, OdbError> {
        let path = path.as_ref().to_path_buf();
        let lock_path = lock_path_for(&path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    OdbError::Locked {
                        realm: path.display().to_string(),
                    }
                } else {
                    OdbError::LockCreate {
                        path: lock_path.clone(),
                        source: e,
                    }
                }
            })?;
        Ok(Self {
            path,
            lock_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Retry [`acquire`](Self::acquire) until `timeout` elapses.
    pub fn acquire_with_timeout(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, OdbError> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::acquire(path.as_ref()) {
                Err(OdbError::Locked { .. }) if Instant::now() < deadline => {
                    std::thread::sleep(RETRY_INTERVAL);
                }
                other => return other,
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Flush, sync and rename the lock file over the target.
    pub fn commit(mut self) -> Result<(), OdbError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        fs::rename(&self.lock_path, &self.path)?;
        self.committed = true;
        Ok(())
    }

    /// Release without touching the target.
    pub fn release(mut self) -> Result<(), OdbError> {
        self.file.take();
        self.committed = true;
        match fs::remove_file(&self.lock_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(LOCK_SUFFIX);
    PathBuf::from(os)
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .flush()
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}

/// Set of realms currently locked inside one process.
pub(crate) type HeldRealms = Arc<Mutex<HashSet<Realm>>>;

enum Guard {
    File(LockFile),
    Process { held: HeldRealms, realm: Realm },
}

/// Advisory single-writer lock on a realm, held until dropped.
///
/// Wrap the whole read-root, compute, update-pointer sequence in one of
/// these; dropping it on any path, including `?` early returns, releases it.
pub struct RealmLock {
    realm: Realm,
    guard: Option<Guard>,
}

impl RealmLock {
    /// Lock backed by `<realm>/mdgraph-realm.lock`.
    pub(crate) fn file(realm: &Realm, lock_target: &Path, timeout: Duration) -> Result<Self, OdbError> {
        let lock = LockFile::acquire_with_timeout(lock_target, timeout).map_err(|e| match e {
            OdbError::Locked { .. } => OdbError::Locked {
                realm: realm.to_string(),
            },
            other => other,
        })?;
        debug!(realm = %realm, "realm lock acquired");
        Ok(Self {
            realm: realm.clone(),
            guard: Some(Guard::File(lock)),
        })
    }

    /// Lock tracked in a process-local set.
    pub(crate) fn in_process(held: &HeldRealms, realm: &Realm, timeout: Duration) -> Result<Self, OdbError> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut set = held.lock().map_err(|_| OdbError::Poisoned("realm lock set"))?;
                if set.insert(realm.clone()) {
                    break;
                }
            }
            if Instant::now() >= deadline {
                return Err(OdbError::Locked {
                    realm: realm.to_string(),
                });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
        debug!(realm = %realm, "realm lock acquired");
        Ok(Self {
            realm: realm.clone(),
            guard: Some(Guard::Process {
                held: Arc::clone(held),
                realm: realm.clone(),
            }),
        })
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }
}

impl Drop for RealmLock {
    fn drop(&mut self) {
        match self.guard.take() {
            Some(Guard::File(lock)) => {
                if let Err(e) = lock.release() {
                    warn!(realm = %self.realm, error = %e, "failed to remove realm lock file");
                }
            }
            Some(Guard::Process { held, realm }) => {
                held.lock().unwrap_or_else(PoisonError::into_inner).remove(&realm);
            }
            None => {}
        }
        debug!(realm = %self.realm, "realm lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pointer");
        fs::write(&target, b"old").unwrap();

        let mut lock = LockFile::acquire(&target).unwrap();
        assert!(lock.lock_path().exists());
        lock.write_all(b"new").unwrap();
        lock.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert!(!dir.path().join("pointer.lock").exists());
    }

    #[test]
    fn drop_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pointer");
        fs::write(&target, b"old").unwrap();
        {
            let mut lock = LockFile::acquire(&target).unwrap();
            lock.write_all(b"discarded").unwrap();
        }
        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(!dir.path().join("pointer.lock").exists());
    }

    #[test]
    fn second_acquire_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pointer");
        let _held = LockFile::acquire(&target).unwrap();
        assert!(matches!(LockFile::acquire(&target), Err(OdbError::Locked { .. })));
        assert!(matches!(
            LockFile::acquire_with_timeout(&target, Duration::from_millis(30)),
            Err(OdbError::Locked { .. })
        ));
    }

    #[test]
    fn in_process_lock_released_on_drop() {
        let held = HeldRealms::default();
        let realm = Realm::new("mem");
        {
            let _lock = RealmLock::in_process(&held, &realm, Duration::ZERO).unwrap();
            assert!(matches!(
                RealmLock::in_process(&held, &realm, Duration::ZERO),
                Err(OdbError::Locked { .. })
            ));
        }
        assert!(RealmLock::in_process(&held, &realm, Duration::ZERO).is_ok());
    }

    #[test]
    fn poisoned_lock_set_is_an_error() {
        let held = HeldRealms::default();
        let poisoner = Arc::clone(&held);
        let _ = std::thread::spawn(move || {
            let _set = poisoner.lock().unwrap();
            panic!("writer died holding the set");
        })
        .join();
        assert!(matches!(
            RealmLock::in_process(&held, &Realm::new("mem"), Duration::ZERO),
            Err(OdbError::Poisoned(_))
        ));
    }

    #[test]
    fn file_realm_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let realm = Realm::local(dir.path());
        let target = dir.path().join("mdgraph-realm");
        {
            let _lock = RealmLock::file(&realm, &target, Duration::ZERO).unwrap();
            assert!(dir.path().join("mdgraph-realm.lock").exists());
        }
        assert!(!dir.path().join("mdgraph-realm.lock").exists());
    }
}
