//! Storage backends.
//!
//! A backend moves raw bytes in and out of durable storage. Typed access
//! lives in [`Store`](crate::Store), which layers JSON on top.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::CacheError;

/// Raw key-value storage.
///
/// Implementations must be safe to share between tasks; the storefront
/// holds one backend for the whole process.
pub trait KvBackend: Send + Sync {
    /// Read the bytes stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Remove `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Check whether `key` is present.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }

    /// List stored keys.
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// In-process backend used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CacheError {
    CacheError::StoreError("memory store lock poisoned".to_string())
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Backend that keeps one JSON file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a file store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| CacheError::OpenError(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    /// Directory holding the store's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Map a key to a filesystem-safe file stem.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Unique sibling of `path` to stage a write in. Concurrent writers of the
/// same key never share a staging file.
fn temp_path(path: &Path) -> PathBuf {
    let suffix: u32 = rand::random();
    path.with_extension(format!("{:08x}.tmp", suffix))
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp = temp_path(&path);
        if let Err(e) = fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::trace!(key, path = %path.display(), "wrote record");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.path_for(key).is_file())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let suffix: u64 = rand::random();
        std::env::temp_dir().join(format!("storefront-kv-test-{:x}", suffix))
    }

    #[test]
    fn test_memory_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("a").unwrap(), None);

        backend.set("a", b"1").unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(backend.exists("a").unwrap());

        backend.delete("a").unwrap();
        assert!(!backend.exists("a").unwrap());
    }

    #[test]
    fn test_memory_keys_sorted() {
        let backend = MemoryBackend::new();
        backend.set("b", b"{}").unwrap();
        backend.set("a", b"{}").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_backend_persists_across_instances() {
        let dir = scratch_dir();
        {
            let backend = FileBackend::open(&dir).unwrap();
            backend.set("shop:cart", b"[1,2]").unwrap();
        }

        let reopened = FileBackend::open(&dir).unwrap();
        assert_eq!(reopened.get("shop:cart").unwrap(), Some(b"[1,2]".to_vec()));
        assert_eq!(reopened.keys().unwrap(), vec!["shop_cart"]);

        reopened.delete("shop:cart").unwrap();
        assert_eq!(reopened.get("shop:cart").unwrap(), None);
        // Deleting twice is fine.
        reopened.delete("shop:cart").unwrap();

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_writes_leave_no_staging_files() {
        let dir = scratch_dir();
        let backend = FileBackend::open(&dir).unwrap();
        backend.set("shop:orders", b"[]").unwrap();
        backend.set("shop:orders", b"[1]").unwrap();

        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["shop_orders.json"]);
        assert_eq!(backend.get("shop:orders").unwrap(), Some(b"[1]".to_vec()));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let path = Path::new("/data/shop_cart.json");
        let a = temp_path(path);
        let b = temp_path(path);
        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
        assert!(a.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("store:orders"), "store_orders");
        assert_eq!(file_stem("../escape"), ".._escape");
    }
}
