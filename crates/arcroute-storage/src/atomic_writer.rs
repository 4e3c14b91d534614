//! Atomic file writer
//!
//! Writes go to a `<path>.tmp` sibling and are renamed into place on
//! commit, so a concurrent reader in another process never observes a
//! partially written artifact. Dropping an uncommitted writer removes the
//! temporary file.

use crate::error::CacheResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writer that stages content in a temporary file and renames on commit
pub struct AtomicWriter {
    temp_path: PathBuf,
    final_path: PathBuf,
    file: File,
}

impl AtomicWriter {
    /// Start an atomic write for the given destination path
    ///
    /// Creates the parent directory if it does not exist.
    pub fn create<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let final_path = path.as_ref().to_path_buf();
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = Self::temp_path(&final_path);
        let file = File::create(&temp_path)?;

        Ok(Self {
            temp_path,
            final_path,
            file,
        })
    }

    /// Append bytes to the staged file
    pub fn write(&mut self, data: &[u8]) -> CacheResult<()> {
        self.file.write_all(data)?;
        Ok(())
    }

    /// Flush, sync, and atomically rename the staged file into place
    pub fn commit(mut self) -> CacheResult<()> {
        self.file.flush()?;
        self.file.sync_all()?;

        let temp_path = self.temp_path.clone();
        let final_path = self.final_path.clone();

        // Drop must not delete the staged file we are about to rename.
        std::mem::forget(self);

        fs::rename(&temp_path, &final_path)?;
        Ok(())
    }

    fn temp_path(final_path: &Path) -> PathBuf {
        let mut temp = final_path.as_os_str().to_owned();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.temp_path);
    }
}

/// Write a complete byte buffer to `path` atomically
pub fn write_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> CacheResult<()> {
    let mut writer = AtomicWriter::create(path)?;
    writer.write(data)?;
    writer.commit()
}
