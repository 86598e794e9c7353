use crate::error::KVError;

/// Callback for [`KVStore::update`]: receives the current value (if any)
/// and returns the value to store.
pub type UpdateFn<'a> = dyn FnMut(Option<&[u8]>) -> Result<Vec<u8>, KVError> + 'a;

/// KVStore provides a document-style key-value storage interface.
///
/// Keys follow a namespaced convention: `policy:supplement:00000000000000000042`.
/// Values are opaque bytes; callers serialize documents themselves.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any existing value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Atomically read, transform and write back a single key.
    ///
    /// The read and the write happen inside one write transaction, so two
    /// concurrent updates of the same key are applied one after the other
    /// and neither is lost. If `f` returns an error nothing is written.
    /// Returns the stored value.
    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Vec<u8>, KVError>;
}
