//! Record Store
//!
//! Each record kind lives in one JSON document holding a top-level array.
//! Every operation works on the whole list: load everything, change it in
//! memory, write everything back. There is no index and no schema version.
//!
//! # Failure behavior
//!
//! - A missing document is treated as empty and re-created as `[]`.
//! - `load_all` on an unreadable or corrupt document logs the failure and
//!   returns an empty list.
//! - `update` on a corrupt document fails instead of overwriting it.
//! - Writes replace the document atomically (see [`FileBackend`]).
//!
//! `update` holds a per-store lock across its load and save, so concurrent
//! requests in one process cannot lose each other's appended records.
//! Separate processes sharing a data directory are not coordinated.

use sdk::context::{RecordUpdate, StoreHandleImpl};
use sdk::errors::EngineError;
use sdk::records::{Account, EssaySubmission};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;

pub mod backend;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

/// The two persisted record lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Accounts,
    Essays,
}

impl RecordKind {
    /// File name of the kind's document inside the data directory
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Accounts => "users.json",
            RecordKind::Essays => "essays.json",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Accounts => write!(f, "accounts"),
            RecordKind::Essays => write!(f, "essays"),
        }
    }
}

/// Whole-list persistence for one record kind
pub struct RecordStore<T> {
    kind: RecordKind,
    backend: Box<dyn StorageBackend>,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open a store over `backend`, initializing a missing document to `[]`
    pub fn open(kind: RecordKind, backend: Box<dyn StorageBackend>) -> Result<Self, EngineError> {
        let store = Self {
            kind,
            backend,
            write_lock: Mutex::new(()),
            _records: PhantomData,
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    /// Open the file-backed store for `kind` under `data_dir`
    pub fn open_in(data_dir: &Path, kind: RecordKind) -> Result<Self, EngineError> {
        let backend = FileBackend::new(data_dir.join(kind.file_name()));
        tracing::info!("{} will be saved to: {}", kind, backend.describe());
        Self::open(kind, Box::new(backend))
    }

    /// In-memory store, starting empty
    pub fn in_memory(kind: RecordKind) -> Self {
        Self {
            kind,
            backend: Box::new(MemoryBackend::with_contents(b"[]".to_vec())),
            write_lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn location(&self) -> String {
        self.backend.describe()
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        let missing = self
            .backend
            .read()
            .map_err(|e| self.store_error("read", e))?
            .is_none();

        if missing {
            tracing::info!("Initializing empty {} at {}", self.kind, self.location());
            self.write_records(&[])?;
        }
        Ok(())
    }

    /// Load every record in stored order
    ///
    /// Never fails; see the module docs for how bad documents are handled.
    pub fn load_all(&self) -> Vec<T> {
        match self.read_records() {
            Ok(Some(records)) => records,
            Ok(None) => {
                if let Err(e) = self.ensure_initialized() {
                    tracing::error!("Could not re-create {}: {}", self.kind, e);
                }
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Could not read {}: {}", self.kind, e);
                Vec::new()
            }
        }
    }

    /// Replace the stored list with `records`
    pub fn save_all(&self, records: &[T]) -> Result<(), EngineError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| EngineError::Store(format!("{} lock poisoned", self.kind)))?;
        self.write_records(records)
    }

    /// Load, apply `apply`, and save only if it returned `Ok`
    ///
    /// # Errors
    ///
    /// Returns the error from `apply` unchanged (nothing is written), or
    /// `EngineError::Store` if the document is corrupt or the write fails.
    pub fn update(&self, apply: RecordUpdate<'_, T>) -> Result<(), EngineError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| EngineError::Store(format!("{} lock poisoned", self.kind)))?;

        let mut records = self.read_records()?.unwrap_or_default();
        apply(&mut records)?;
        self.write_records(&records)
    }

    /// Number of stored records, failing on an unreadable document
    ///
    /// Unlike [`load_all`](Self::load_all), a corrupt document is reported
    /// rather than treated as empty.
    pub fn count(&self) -> Result<usize, EngineError> {
        Ok(self.read_records()?.map(|records| records.len()).unwrap_or(0))
    }

    fn read_records(&self) -> Result<Option<Vec<T>>, EngineError> {
        let bytes = match self
            .backend
            .read()
            .map_err(|e| self.store_error("read", e))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| self.store_error("parse", e))
    }

    fn write_records(&self, records: &[T]) -> Result<(), EngineError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(|e| self.store_error("encode", e))?;
        self.backend.write(&bytes).map_err(|e| {
            let err = self.store_error("write", e);
            tracing::error!("Error writing {}: {}", self.kind, err);
            err
        })
    }

    fn store_error(&self, action: &str, cause: impl fmt::Display) -> EngineError {
        EngineError::Store(format!(
            "failed to {} {} at {}: {}",
            action,
            self.kind,
            self.location(),
            cause
        ))
    }
}

impl<T> StoreHandleImpl<T> for RecordStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn load_all(&self) -> Vec<T> {
        RecordStore::load_all(self)
    }

    fn save_all(&self, records: &[T]) -> Result<(), EngineError> {
        RecordStore::save_all(self, records)
    }

    fn update(&self, apply: RecordUpdate<'_, T>) -> Result<(), EngineError> {
        RecordStore::update(self, apply)
    }
}

/// Store of registered accounts
pub type AccountStore = RecordStore<Account>;

/// Store of essay submissions
pub type EssayStore = RecordStore<EssaySubmission>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn essay(user: &str, question: &str) -> EssaySubmission {
        EssaySubmission::new(user, question, "body", "feedback")
    }

    #[test]
    fn test_open_initializes_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in(temp.path(), RecordKind::Accounts).unwrap();

        let raw = std::fs::read_to_string(temp.path().join("users.json")).unwrap();
        assert_eq!(raw, "[]");
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let store = EssayStore::in_memory(RecordKind::Essays);
        let records = vec![essay("alice", "1"), essay("bob", "2"), essay("alice", "3")];

        store.save_all(&records).unwrap();
        assert_eq!(store.load_all(), records);
    }

    #[test]
    fn test_documents_are_pretty_printed() {
        let temp = tempfile::tempdir().unwrap();
        let store = AccountStore::open_in(temp.path(), RecordKind::Accounts).unwrap();
        store
            .save_all(&[Account::new("alice", "a@example.com", "pw")])
            .unwrap();

        let raw = std::fs::read_to_string(temp.path().join("users.json")).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"username\": \"alice\""));
    }

    #[test]
    fn test_corrupt_document_loads_empty() {
        let backend = MemoryBackend::with_contents(b"{not json".to_vec());
        let store: AccountStore = RecordStore::open(RecordKind::Accounts, Box::new(backend)).unwrap();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_count_reports_corruption() {
        let store = EssayStore::in_memory(RecordKind::Essays);
        store.save_all(&[essay("alice", "1"), essay("bob", "2")]).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let backend = MemoryBackend::with_contents(b"[{".to_vec());
        let corrupt: EssayStore = RecordStore::open(RecordKind::Essays, Box::new(backend)).unwrap();
        assert!(corrupt.count().is_err());
    }

    #[test]
    fn test_update_refuses_corrupt_document() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("essays.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = EssayStore::open_in(temp.path(), RecordKind::Essays).unwrap();
        let result = store.update(&mut |records| {
            records.push(essay("alice", "q"));
            Ok(())
        });

        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_non_string_field_treated_as_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("essays.json");
        let raw = r#"[
  {
    "username": "alice",
    "question": "Why?",
    "essay": "Because.",
    "feedback": "Fine",
    "submittedAt": "2024-01-01T00:00:00.000Z"
  },
  {
    "username": "bob",
    "question": 7,
    "essay": "Because.",
    "feedback": "Fine",
    "submittedAt": "2024-01-01T00:00:00.000Z"
  }
]"#;
        std::fs::write(&path, raw).unwrap();

        let store = EssayStore::open_in(temp.path(), RecordKind::Essays).unwrap();
        assert!(store.load_all().is_empty());
        assert!(store.count().is_err());

        let result = store.update(&mut |records| {
            records.push(essay("carol", "q"));
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
    }

    #[test]
    fn test_update_error_writes_nothing() {
        let store = AccountStore::in_memory(RecordKind::Accounts);
        let result = store.update(&mut |records| {
            records.push(Account::new("x", "x@example.com", "pw"));
            Err(EngineError::validation("nope"))
        });

        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_deleted_file_is_reinitialized() {
        let temp = tempfile::tempdir().unwrap();
        let store = EssayStore::open_in(temp.path(), RecordKind::Essays).unwrap();
        store.save_all(&[essay("alice", "q")]).unwrap();

        std::fs::remove_file(temp.path().join("essays.json")).unwrap();

        assert!(store.load_all().is_empty());
        assert!(temp.path().join("essays.json").exists());
    }

    #[test]
    fn test_concurrent_updates_keep_every_record() {
        let temp = tempfile::tempdir().unwrap();
        let store = Arc::new(EssayStore::open_in(temp.path(), RecordKind::Essays).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..5 {
                        store
                            .update(&mut |records| {
                                records.push(essay("user", &format!("{}-{}", i, j)));
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.load_all().len(), 40);
    }
}
