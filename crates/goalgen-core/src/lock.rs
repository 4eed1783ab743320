use crate::error::{GoalgenError, Result};
use crate::paths;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Advisory exclusive lock on an output directory.
///
/// The manifest has no merge semantics — `save` fully replaces it — so two
/// concurrent generation runs against the same directory would silently
/// lose one run's tracking state. The lock file is created with O_EXCL and
/// removed on drop; it is held for the whole run.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    pub fn acquire(out_dir: &Path) -> Result<Self> {
        let path = paths::lock_path(out_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Record the holder to help diagnose stale locks.
                let _ = writeln!(file, "pid {}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(GoalgenError::OutputDirLocked(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_and_drop_removes_lock_file() {
        let dir = TempDir::new().unwrap();
        let lock_file = dir.path().join(".goalgen/lock");
        {
            let _lock = DirLock::acquire(dir.path()).unwrap();
            assert!(lock_file.exists());
        }
        assert!(!lock_file.exists());
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let _lock = DirLock::acquire(dir.path()).unwrap();
        assert!(matches!(
            DirLock::acquire(dir.path()),
            Err(GoalgenError::OutputDirLocked(_))
        ));
    }

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let dir = TempDir::new().unwrap();
        drop(DirLock::acquire(dir.path()).unwrap());
        assert!(DirLock::acquire(dir.path()).is_ok());
    }
}
