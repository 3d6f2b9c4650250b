//! Raw byte storage underneath a record store

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where a record document's bytes live
pub trait StorageBackend: Send + Sync {
    /// Read the whole document; `Ok(None)` when it does not exist
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the whole document
    fn write(&self, bytes: &[u8]) -> io::Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// A JSON document on disk
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so readers see either the old document or the new one.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, bytes)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory document, for tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    bytes: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing document bytes
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }

    /// Current document bytes, if any
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        self.bytes
            .lock()
            .map(|b| b.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory backend lock poisoned"))
    }

    fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self
            .bytes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory backend lock poisoned"))?;
        *guard = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_missing_is_none() {
        let temp = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(temp.path().join("users.json"));
        assert!(backend.read().unwrap().is_none());
    }

    #[test]
    fn test_file_backend_write_replaces_and_cleans_up() {
        let temp = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(temp.path().join("users.json"));

        backend.write(b"[1]").unwrap();
        backend.write(b"[2]").unwrap();

        assert_eq!(backend.read().unwrap().unwrap(), b"[2]");
        assert!(!temp.path().join("users.json.tmp").exists());
    }

    #[test]
    fn test_file_backend_creates_parent() {
        let temp = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(temp.path().join("nested/dir/essays.json"));
        backend.write(b"[]").unwrap();
        assert!(temp.path().join("nested/dir/essays.json").exists());
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        assert!(backend.read().unwrap().is_none());
        backend.write(b"[]").unwrap();
        assert_eq!(backend.contents().unwrap(), b"[]");
    }
}
