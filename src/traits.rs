// For types that keep the serialized snapshot somewhere durable.
pub trait StorageBackend: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Previously stored snapshot text, or `None` if nothing has been stored yet.
    fn get(&self) -> Result<Option<String>, Self::Error>;

    /// Replace the stored snapshot.
    fn set(&self, snapshot: &str) -> Result<(), Self::Error>;

    /// Drop the stored snapshot. Removing a snapshot that doesn't exist must not be an error.
    fn remove(&self) -> Result<(), Self::Error>;
}

impl<S> StorageBackend for std::sync::Arc<S>
where
    S: StorageBackend,
{
    type Error = S::Error;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        (**self).get()
    }

    fn set(&self, snapshot: &str) -> Result<(), Self::Error> {
        (**self).set(snapshot)
    }

    fn remove(&self) -> Result<(), Self::Error> {
        (**self).remove()
    }
}
