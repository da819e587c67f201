//! Storage backends for the persisted snapshot.
//!
//! None of these are picked implicitly by the library. A process decides which host it persists into at its
//! entry point and hands the backend to [`CacheWriter`](crate::CacheWriter).

use std::collections::HashMap;
use std::fmt::Debug;
use std::fmt::Display;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::traits::StorageBackend;
use crate::types::DEFAULT_STORAGE_KEY;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

type GetFn = dyn Fn() -> Result<Option<String>, BoxedError> + Send + Sync;
type SetFn = dyn Fn(&str) -> Result<(), BoxedError> + Send + Sync;
type RemoveFn = dyn Fn() -> Result<(), BoxedError> + Send + Sync;

#[derive(Debug)]
pub struct FnStorageError(BoxedError);

impl Display for FnStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for FnStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

/// Backend made of three injected functions: get, set and remove.
pub struct FnStorage {
    storage_get:    Box<GetFn>,
    storage_set:    Box<SetFn>,
    storage_remove: Box<RemoveFn>,
}

impl FnStorage {
    pub fn new<G, S, R>(storage_get: G, storage_set: S, storage_remove: R) -> Self
    where
        G: Fn() -> Result<Option<String>, BoxedError> + Send + Sync + 'static,
        S: Fn(&str) -> Result<(), BoxedError> + Send + Sync + 'static,
        R: Fn() -> Result<(), BoxedError> + Send + Sync + 'static,
    {
        Self {
            storage_get:    Box::new(storage_get),
            storage_set:    Box::new(storage_set),
            storage_remove: Box::new(storage_remove),
        }
    }
}

impl Debug for FnStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStorage").finish_non_exhaustive()
    }
}

impl StorageBackend for FnStorage {
    type Error = FnStorageError;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        (self.storage_get)().map_err(FnStorageError)
    }

    fn set(&self, snapshot: &str) -> Result<(), Self::Error> {
        (self.storage_set)(snapshot).map_err(FnStorageError)
    }

    fn remove(&self) -> Result<(), Self::Error> {
        (self.storage_remove)().map_err(FnStorageError)
    }
}

/// A process-local key-value host. Clones share the same slots, so several writers (or a writer and a test) can
/// look at the same key.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    key:   String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_STORAGE_KEY)
    }

    pub fn with_key<S: Into<String>>(key: S) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            key:   key.into(),
        }
    }

    /// Another handle on the same host, addressing a different key.
    pub fn for_key<S: Into<String>>(&self, key: S) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
            key:   key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn contents(&self) -> Option<String> {
        self.slots.lock().get(&self.key).cloned()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryStorage {
    type Error = std::convert::Infallible;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.contents())
    }

    fn set(&self, snapshot: &str) -> Result<(), Self::Error> {
        self.slots.lock().insert(self.key.clone(), snapshot.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), Self::Error> {
        self.slots.lock().remove(&self.key);
        Ok(())
    }
}

/// Durable host: one file per key inside a directory.
///
/// Writes go to a temporary file in the same directory which is then renamed over the target, so a reader never
/// sees a partially written snapshot.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    key: String,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self::with_key(dir, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key<P: Into<PathBuf>, S: Into<String>>(dir: P, key: S) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

impl StorageBackend for FileStorage {
    type Error = io::Error;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        match std::fs::read_to_string(self.path()) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, snapshot: &str) -> Result<(), Self::Error> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(snapshot.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), Self::Error> {
        match std::fs::remove_file(self.path()) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn memory_storage_shares_slots_between_clones() {
        let host = MemoryStorage::new();
        let other = host.clone();
        host.set("{}").unwrap();
        assert_eq!(other.get().unwrap().as_deref(), Some("{}"));

        let foreign = host.for_key("elsewhere");
        assert_eq!(foreign.get().unwrap(), None);

        other.remove().unwrap();
        assert_eq!(host.get().unwrap(), None);
    }

    #[test]
    fn file_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get().unwrap(), None);
        storage.remove().unwrap();

        storage.set("first").unwrap();
        storage.set("second").unwrap();
        assert_eq!(storage.get().unwrap().as_deref(), Some("second"));
        assert!(storage.path().ends_with("__RelayCacheManager__.json"));

        storage.remove().unwrap();
        assert_eq!(storage.get().unwrap(), None);
    }

    #[test]
    fn file_storage_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = FileStorage::with_key(dir.path(), "a");
        let b = FileStorage::with_key(dir.path(), "b");
        a.set("A").unwrap();
        assert_eq!(b.get().unwrap(), None);
        assert_eq!(a.get().unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn fn_storage_passes_errors_through() {
        let storage = FnStorage::new(
            || Err("quota".into()),
            |_| Ok(()),
            || Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied").into()),
        );
        let err = storage.get().unwrap_err();
        assert_eq!(err.to_string(), "quota");
        let source = std::error::Error::source(&err).expect("wrapped error is the source");
        assert_eq!(source.to_string(), "quota");
        assert!(storage.set("x").is_ok());
        assert_eq!(storage.remove().unwrap_err().to_string(), "denied");
    }
}
