use async_trait::async_trait;

use crate::Result;

/// Trait for the backend's object (blob) storage.
///
/// Paths are namespaced by bucket. Uploads never overwrite: writing to an
/// occupied path fails with `ObjectExists`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads bytes to `bucket/path` with an explicit content type.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Removes an object. Idempotent: removing a missing path succeeds.
    async fn remove(&self, bucket: &str, path: &str) -> Result<()>;

    /// Returns the public URL for an object path.
    ///
    /// Purely syntactic; the object need not exist.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Returns a time-limited signed URL for an object path.
    async fn signed_url(&self, bucket: &str, path: &str, ttl_seconds: u64) -> Result<String>;
}
