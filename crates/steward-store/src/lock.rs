use crate::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Advisory file lock serializing compare-and-swap sequences across processes
/// sharing one directory store. Released on drop.
pub struct StoreLock {
    lock_file: File,
}

impl StoreLock {
    fn open(lock_path: &Path) -> Result<File, StoreError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)?)
    }

    pub fn exclusive(lock_path: &Path) -> Result<Self, StoreError> {
        let file = Self::open(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| StoreError::LockFailed(format!("{}: {e}", lock_path.display())))?;
        Ok(Self { lock_file: file })
    }

    pub fn shared(lock_path: &Path) -> Result<Self, StoreError> {
        let file = Self::open(lock_path)?;
        file.lock_shared()
            .map_err(|e| StoreError::LockFailed(format!("{}: {e}", lock_path.display())))?;
        Ok(Self { lock_file: file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn can_lock(lock_path: &Path) -> bool {
        let file = File::open(lock_path).unwrap();
        let free = file.try_lock_exclusive().is_ok();
        if free {
            file.unlock().unwrap();
        }
        free
    }

    #[test]
    fn exclusive_lock_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("nested").join(".lock");
        {
            let _lock = StoreLock::exclusive(&lock_path).unwrap();
            assert!(lock_path.exists());
        }
    }

    #[test]
    fn held_lock_excludes_others() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");
        let _lock = StoreLock::exclusive(&lock_path).unwrap();
        assert!(!can_lock(&lock_path));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");
        {
            let _lock = StoreLock::exclusive(&lock_path).unwrap();
        }
        assert!(can_lock(&lock_path));
        let _shared = StoreLock::shared(&lock_path).unwrap();
        assert!(!can_lock(&lock_path));
    }
}
