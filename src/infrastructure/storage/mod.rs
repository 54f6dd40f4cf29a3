use async_trait::async_trait;
use derive_more::Display;

mod s3;

pub use s3::S3Storage;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum StorageError {
    #[display("Upload failed: {_0}")]
    UploadFailed(String),

    #[display("Move failed: {_0}")]
    MoveFailed(String),

    #[display("Delete failed: {_0}")]
    DeleteFailed(String),

    #[display("List failed: {_0}")]
    ListFailed(String),

    #[display("Storage backend error: {_0}")]
    BackendError(String),
}

/// Object storage collaborator: the pipeline only needs upload, public URL
/// resolution, and relocation; the sweep and health check add list/delete
/// and a reachability probe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// URL a browser can fetch the object from. Pure derivation; resolvable
    /// only once (and as long as) the object exists at `key`.
    fn public_url(&self, key: &str) -> String;

    async fn move_object(&self, from_key: &str, to_key: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn check_connection(&self) -> Result<(), StorageError>;
}
