use crate::{Error, Result, SiteName};
use std::{
    fs::{self, File, OpenOptions, TryLockError},
    io::Write,
    path::{Path, PathBuf},
};

/// Advisory lock serializing mutating operations of one site.
///
/// The kernel holds the lock on the open file and releases it when the
/// guard is dropped or the process dies, a leftover lock file blocks nothing.
#[derive(Debug)]
pub struct SiteLock {
    path: PathBuf,
    file: File,
}

impl SiteLock {
    pub fn path_for(sites_dir: &Path, site: &SiteName) -> PathBuf {
        sites_dir.join(format!(".{site}.lock"))
    }

    pub fn acquire(sites_dir: &Path, site: &SiteName) -> Result<SiteLock> {
        fs::create_dir_all(sites_dir)?;
        let path = Self::path_for(sites_dir, site);
        let mut file = OpenOptions::new().create(true).truncate(false).write(true).open(&path)?;
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(Error::SiteLocked(site.to_string(), path)),
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        tracing::debug!("acquired {}", path.display());
        Ok(SiteLock { path, file })
    }
}

impl Drop for SiteLock {
    fn drop(&mut self) {
        // the file stays, removing it would let a waiter lock an unlinked inode
        if let Err(e) = self.file.unlock() {
            tracing::warn!("failed to unlock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteName::new("demo").unwrap();
        let lock = SiteLock::acquire(dir.path(), &site).unwrap();
        assert!(matches!(
            SiteLock::acquire(dir.path(), &site),
            Err(Error::SiteLocked(_, _))
        ));
        let other = SiteName::new("other").unwrap();
        assert!(SiteLock::acquire(dir.path(), &other).is_ok());
        drop(lock);
        assert!(SiteLock::acquire(dir.path(), &site).is_ok());
    }

    #[test]
    fn test_leftover_lock_file_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteName::new("demo").unwrap();
        // a process killed without unwinding leaves its pid behind
        fs::write(SiteLock::path_for(dir.path(), &site), "4242\n").unwrap();
        let lock = SiteLock::acquire(dir.path(), &site).unwrap();
        let content = fs::read_to_string(SiteLock::path_for(dir.path(), &site)).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
        drop(lock);
    }
}
