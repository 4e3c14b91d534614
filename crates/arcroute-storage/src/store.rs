//! Key/value stores for compiled routing artifacts
//!
//! Values are structured (`serde_json::Value`) rather than raw bytes so the
//! matcher and generator tables can be stored directly. Keys are namespaced
//! by the caller as `<app_id>.<role>`; see [`artifact_key`].

use crate::atomic_writer::write_atomic;
use crate::error::{CacheError, CacheResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Minimal persistence abstraction for compiled artifacts
///
/// The cache is a pure optimization: `get` returning `None` means the
/// caller recompiles. Implementations must guarantee readers never observe
/// a partially written value.
pub trait ArtifactStore {
    /// Fetch a value, `None` when absent
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &Value) -> CacheResult<()>;

    /// Return `true` if the key is present
    fn has(&self, key: &str) -> CacheResult<bool>;

    /// Remove a value; removing an absent key is not an error
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// Remove every stored value
    fn clear(&self) -> CacheResult<()>;
}

/// Build the store key for one artifact set
///
/// Keys are namespaced by application identifier plus a role tag
/// (`"matcher"` / `"generator"`) so two tables can share one store without
/// collisions.
pub fn artifact_key(app_id: &str, role: &str) -> String {
    format!("{app_id}.{role}")
}

/// File-backed artifact store: one JSON file per key
///
/// Opening the store validates that the directory exists (creating it if
/// needed) and is writable — configuration problems surface at startup, not
/// on the first request. Writes go through the atomic writer.
#[derive(Debug)]
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    /// Open (and if needed create) the store directory
    pub fn open<P: AsRef<Path>>(dir: P) -> CacheResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            CacheError::Config(format!(
                "cannot create cache directory {}: {e}",
                dir.display()
            ))
        })?;

        // Detect a read-only directory now rather than on the first write.
        let probe = dir.join(".write-probe");
        fs::write(&probe, b"").map_err(|e| {
            CacheError::Config(format!(
                "cache directory {} is not writable: {e}",
                dir.display()
            ))
        })?;
        let _ = fs::remove_file(&probe);

        Ok(Self { dir })
    }

    /// The directory this store persists into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Keys are dotted identifiers; anything else is flattened so a key
        // can never escape the store directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let path = self.entry_path(key);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "artifact cache miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&content)
            .map_err(|e| CacheError::InvalidData(format!("{}: {e}", path.display())))?;
        tracing::debug!(key, "artifact cache hit");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> CacheResult<()> {
        let encoded = serde_json::to_vec(value)?;
        write_atomic(self.entry_path(key), &encoded)?;
        tracing::debug!(key, bytes = encoded.len(), "artifact stored");
        Ok(())
    }

    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entry_path(key).exists())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> CacheResult<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// In-memory artifact store for tests and single-process setups
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, HashMap<String, Value>>> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Config(format!("store lock poisoned: {e}")))
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> CacheResult<()> {
        self.lock()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_key_namespacing() {
        assert_eq!(artifact_key("blog", "matcher"), "blog.matcher");
        assert_ne!(
            artifact_key("blog", "matcher"),
            artifact_key("blog", "generator")
        );
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        let value = json!({"fingerprint": "abc", "table": {"GET": []}});
        store.set("app.matcher", &value).unwrap();

        assert!(store.has("app.matcher").unwrap());
        assert_eq!(store.get("app.matcher").unwrap(), Some(value));
    }

    #[test]
    fn test_file_store_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        assert_eq!(store.get("app.matcher").unwrap(), None);
        assert!(!store.has("app.matcher").unwrap());
    }

    #[test]
    fn test_file_store_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        store.set("app.matcher", &json!(1)).unwrap();
        store.delete("app.matcher").unwrap();
        assert!(!store.has("app.matcher").unwrap());

        // Deleting again is not an error
        store.delete("app.matcher").unwrap();
    }

    #[test]
    fn test_file_store_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        store.set("app.matcher", &json!(1)).unwrap();
        store.set("app.generator", &json!(2)).unwrap();
        store.clear().unwrap();

        assert_eq!(store.get("app.matcher").unwrap(), None);
        assert_eq!(store.get("app.generator").unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("cache/artifacts");

        let store = FileArtifactStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        store.set("app.matcher", &json!(true)).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_entry_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        std::fs::write(dir.path().join("app.matcher.json"), b"{ not json").unwrap();
        assert!(matches!(
            store.get("app.matcher").unwrap_err(),
            CacheError::InvalidData(_)
        ));
    }

    #[test]
    fn test_file_store_key_sanitized() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::open(dir.path()).unwrap();

        store.set("app/../escape", &json!(1)).unwrap();
        assert!(store.has("app/../escape").unwrap());
        // The entry stayed inside the store directory
        assert!(dir.path().join("app-..-escape.json").exists());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryArtifactStore::new();
        store.set("app.generator", &json!({"plans": {}})).unwrap();

        assert!(store.has("app.generator").unwrap());
        assert_eq!(
            store.get("app.generator").unwrap(),
            Some(json!({"plans": {}}))
        );

        store.clear().unwrap();
        assert_eq!(store.get("app.generator").unwrap(), None);
    }
}
