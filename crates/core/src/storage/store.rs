use crate::errors::CoreError;

/// Durable key-value store the repository writes through to.
///
/// Values are opaque strings (JSON in practice). Implementations must make a
/// `put` durable before returning `Ok`, and must serialize their own access:
/// the repository may call them from any thread.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    /// Read the value under `key`, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Replace the value under `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Delete `key`. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}
