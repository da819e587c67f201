use std::fmt::Display;

use thiserror::Error;

/// Which backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Get,
    Set,
    Remove,
}

impl Display for StorageOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StorageOp::Get => "get",
            StorageOp::Set => "set",
            StorageOp::Remove => "remove",
        })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// The persisted text is empty. Not the same as a missing snapshot, but handled the same way by the writer.
    #[error("snapshot is empty")]
    EmptySnapshot,

    #[error("malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("record stored under '{key}' claims identity {found:?}")]
    IdentityMismatch { key: String, found: Option<String> },

    #[error("storage {op} failed: {source}")]
    Storage {
        op:     StorageOp,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl CacheError {
    pub fn storage<E>(op: StorageOp, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Storage {
            op,
            source: Box::new(err),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, CacheError::Storage { .. })
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
