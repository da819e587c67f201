//! # record-cache
//!
//! Client-side record cache for graph-shaped data-fetching layers.
//!
//! Think of it as the memory of a GraphQL client: normalized entity records plus "root call" lookups, kept in memory
//! and mirrored into a persisted snapshot so the next process start can answer queries without going to the network.
//!
//! # The Basics
//!
//! There are two components:
//!
//! - [`RecordStore`] holds records keyed by their data id and the root call map (storage key to data id). It can
//!   serialize itself into a snapshot and be restored from one.
//! - [`CacheWriter`] owns a store and exposes the read/write contract a data-fetching framework expects:
//!   `write_field`, `write_node`, `read_node`, `write_root_call`, `read_root_call`, and `clear_storage`.
//!
//! Every persisting mutation serializes the entire store and hands it to a [`StorageBackend`]. Persistence is best
//! effort: the in-memory store is authoritative, and a backend that fails to store or remove the snapshot never makes a
//! cache operation fail. Likewise, a missing or corrupt snapshot at construction time simply means starting empty.
//!
//! ```ignore
//! use record_cache::prelude::*;
//!
//! let writer = CacheWriter::new(MemoryStorage::new());
//! writer.write_field("1", "name", "Alice", Some("Person"));
//!
//! let alice = writer.read_node("1").unwrap();
//! assert_eq!(alice.typename(), Some("Person"));
//! ```
//!
//! # Storage
//!
//! The library never binds to a host storage on its own. The backends in [`storage`] are:
//!
//! - [`FnStorage`](storage::FnStorage) made of three injected functions;
//! - [`MemoryStorage`](storage::MemoryStorage), a process-local key-value host;
//! - [`FileStorage`](storage::FileStorage), one file per key in a directory.
//!
//! The `record-cache` binary (feature `cli`) is where the file host gets bound as the default.

pub mod cache_writer;
pub mod error;
pub mod record_store;
pub mod storage;
pub mod traits;
pub mod types;

#[doc(inline)]
pub use cache_writer::CacheWriter;
#[doc(inline)]
pub use error::CacheError;
#[doc(inline)]
pub use record_store::RecordStore;
#[doc(inline)]
pub use traits::StorageBackend;

#[doc(hidden)]
pub use serde_json;

pub mod prelude {
    pub use crate::cache_writer::CacheWriter;
    pub use crate::error::CacheError;
    pub use crate::record_store::RecordStore;
    pub use crate::storage::FileStorage;
    pub use crate::storage::FnStorage;
    pub use crate::storage::MemoryStorage;
    pub use crate::traits::StorageBackend;
    pub use crate::types::*;
}

/// Builds a [`Record`](types::Record) from a data id and `field => value` pairs. Values go through
/// [`serde_json::json!`].
///
/// ```ignore
/// let alice = record!("1", "__typename" => "Person", "name" => "Alice", "age" => 30);
/// ```
#[macro_export]
macro_rules! record {
    ($data_id:expr $(, $field:expr => $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut record = $crate::types::Record::new($data_id);
        $( record.set($field, $crate::serde_json::json!($value)); )*
        record
    }};
}
