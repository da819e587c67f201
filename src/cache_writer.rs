use std::future::Future;
use std::sync::Arc;

use fieldx::fxstruct;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::error::CacheError;
use crate::error::Result;
use crate::error::StorageOp;
use crate::record_store::RecordStore;
use crate::traits::StorageBackend;
use crate::types::PersistPolicy;
use crate::types::Record;

/// The mutation/read surface a data-fetching layer talks to.
///
/// The writer owns a single [`RecordStore`] and mirrors it into a [`StorageBackend`] as a whole-store snapshot.
/// Memory is authoritative: a backend that refuses to store or remove the snapshot is logged and otherwise
/// ignored, so the cache keeps working when the host storage is full or disabled.
///
/// ```ignore
/// let writer = CacheWriter::new(FileStorage::new(cache_dir));
/// writer.write_field("1", "name", "Alice", Some("Person"));
/// writer.write_root_call("viewer", None, "1");
///
/// assert_eq!(writer.read_root_call("viewer", None).await.as_deref(), Some("1"));
/// ```
#[fxstruct(sync, no_new, default(off), builder(post_build))]
pub struct CacheWriter<S>
where
    S: StorageBackend,
{
    #[fieldx(get(clone), builder(required))]
    storage: Arc<S>,

    /// Which mutations write the snapshot back. See [`PersistPolicy`].
    #[fieldx(get(copy), default(PersistPolicy::EveryMutation))]
    persist_policy: PersistPolicy,

    #[fieldx(lock, private, get, writer, set, builder(off), default(RecordStore::new()))]
    store: RecordStore,
}

impl<S> CacheWriter<S>
where
    S: StorageBackend,
{
    pub fn new(storage: S) -> Self {
        Self::with_policy(storage, PersistPolicy::default())
    }

    pub fn with_policy(storage: S, persist_policy: PersistPolicy) -> Self {
        Self::builder()
            .storage(Arc::new(storage))
            .persist_policy(persist_policy)
            .build()
            .unwrap()
    }

    // Hydration never fails the construction. Whatever goes wrong, the writer starts with an empty store.
    fn post_build(self) -> Self {
        match self.load_snapshot() {
            Ok(Some(store)) => {
                debug!(records = store.len(), "record store restored from snapshot");
                self.set_store(store);
            }
            Ok(None) => debug!("no snapshot found, starting with an empty record store"),
            Err(err) => warn!(%err, "snapshot is unusable, starting with an empty record store"),
        }
        self
    }

    fn load_snapshot(&self) -> Result<Option<RecordStore>> {
        let text = self
            .storage
            .get()
            .map_err(|err| CacheError::storage(StorageOp::Get, err))?;
        RecordStore::hydrate(text.as_deref())
    }

    /// Serialize the whole store and hand it to the backend. Unlike the implicit persistence performed by the
    /// mutating methods, errors are returned to the caller.
    #[instrument(level = "trace", skip(self))]
    pub fn persist(&self) -> Result<()> {
        let store = self.store();
        self.persist_store(&store)
    }

    // The caller must hold a store guard for the whole call, or a slower writer could overwrite a newer snapshot
    // with an older one.
    fn persist_store(&self, store: &RecordStore) -> Result<()> {
        let snapshot = store.to_json()?;
        self.storage
            .set(&snapshot)
            .map_err(|err| CacheError::storage(StorageOp::Set, err))
    }

    fn persist_or_warn(&self, store: &RecordStore) {
        if let Err(err) = self.persist_store(store) {
            warn!(%err, "snapshot not persisted, continuing in memory");
        }
    }

    /// The current store as snapshot text.
    pub fn snapshot(&self) -> Result<String> {
        self.store().to_json()
    }

    /// Drops the persisted snapshot and starts over with an empty store. The store is reset even if the backend
    /// fails to remove the snapshot.
    #[instrument(level = "trace", skip(self))]
    pub fn clear_storage(&self) {
        let mut store = self.write_store();
        if let Err(err) = self.storage.remove() {
            let err = CacheError::storage(StorageOp::Remove, err);
            warn!(%err, "snapshot not removed");
        }
        *store = RecordStore::new();
    }

    /// Sets a single field of a record, creating the record when there is none yet. `typename` only applies to a
    /// newly created record.
    #[instrument(level = "trace", skip(self, value))]
    pub fn write_field<V: Into<Value>>(&self, data_id: &str, field: &str, value: V, typename: Option<&str>) {
        let mut store = self.write_store();
        let mut record = store
            .take_record(data_id)
            .unwrap_or_else(|| Record::with_typename(data_id, typename));
        record.set(field, value.into());
        store.write_record(data_id, record);

        if self.persist_policy().persists_fields() {
            self.persist_or_warn(&store);
        }
    }

    /// Replaces the whole record at `data_id`.
    #[instrument(level = "trace", skip(self, record))]
    pub fn write_node(&self, data_id: &str, record: Record) {
        let mut store = self.write_store();
        store.write_record(data_id, record);

        if self.persist_policy().persists_nodes() {
            self.persist_or_warn(&store);
        }
    }

    pub fn read_node(&self, data_id: &str) -> Option<Record> {
        self.store().read_node(data_id).cloned()
    }

    /// Maps `storage_key` to `data_id`. The identifying argument is only there for callers which derive the storage
    /// key from it; it is not a part of the mapping.
    #[instrument(level = "trace", skip(self))]
    pub fn write_root_call(&self, storage_key: &str, _identifying_arg_value: Option<&str>, data_id: &str) {
        let mut store = self.write_store();
        store.write_root_call(storage_key, data_id);

        if self.persist_policy().persists_nodes() {
            self.persist_or_warn(&store);
        }
    }

    /// Synchronous root call lookup.
    pub fn root_call(&self, storage_key: &str) -> Option<String> {
        self.store().root_call(storage_key).map(str::to_string)
    }

    /// Resolves a root call by its name. `call_value` doesn't take part in the lookup.
    ///
    /// The mapping is read when this method is called. The returned future yields to the scheduler once before
    /// resolving, so callers can't come to rely on the answer being available synchronously.
    pub fn read_root_call(
        &self,
        call_name: &str,
        _call_value: Option<&str>,
    ) -> impl Future<Output = Option<String>> + Send + 'static {
        let data_id = self.root_call(call_name);
        async move {
            tokio::task::yield_now().await;
            data_id
        }
    }

    /// Callback flavor of [`read_root_call`](Self::read_root_call). The callback runs exactly once on a spawned
    /// tokio task.
    ///
    /// Only a current-thread runtime guarantees the callback doesn't run before this method returns. On a
    /// multi-thread runtime another worker may pick the task up right away; use [`read_root_call`](Self::read_root_call)
    /// and drive the future yourself if the ordering matters there.
    ///
    /// Must be called from within a tokio runtime.
    pub fn read_root_call_with<F>(&self, call_name: &str, call_value: Option<&str>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        let lookup = self.read_root_call(call_name, call_value);
        tokio::spawn(async move { callback(lookup.await) })
    }
}
