//! Storage gateway trait for the physical tree under the storage root.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;
use crate::types::path::CanonicalPath;

/// Metadata about an item in the physical tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ItemMeta {
    /// Canonical path of the item.
    pub path: CanonicalPath,
    /// Final path segment.
    pub name: String,
    /// Size in bytes (0 for directories).
    pub size_bytes: u64,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Last modified timestamp.
    pub modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Gateway to the physical filesystem tree under a single storage root.
///
/// The gateway owns the physical tree: nothing mutates it outside these
/// primitives. All paths are canonical-relative and are joined against the
/// configured root; any path that would resolve outside the root is
/// rejected, never clamped.
///
/// The trait is defined here in `orgdrive-core` and implemented in
/// `orgdrive-storage`.
#[async_trait]
pub trait StorageGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Create a directory (and any missing ancestors).
    async fn ensure_dir(&self, path: &CanonicalPath) -> AppResult<()>;

    /// Whether an item exists at the path.
    async fn exists(&self, path: &CanonicalPath) -> AppResult<bool>;

    /// Stat an item. Fails with `NotFound` if absent.
    async fn stat(&self, path: &CanonicalPath) -> AppResult<ItemMeta>;

    /// Enumerate the direct children of a directory.
    ///
    /// Dot-prefixed names (quarantine, staging) are not listed. A missing
    /// directory enumerates as empty.
    async fn list(&self, path: &CanonicalPath) -> AppResult<Vec<ItemMeta>>;

    /// Move an item (file or directory) within the root.
    ///
    /// Atomic at the filesystem-rename level on a single volume; falls back
    /// to copy+delete across volumes, in which case a failure after a
    /// partial copy cleans up the truncated destination. Unless `overwrite`
    /// is set, an existing destination fails with `AlreadyExists`.
    async fn move_item(
        &self,
        src: &CanonicalPath,
        dst: &CanonicalPath,
        overwrite: bool,
    ) -> AppResult<()>;

    /// Write bytes to a file, creating parent directories as needed.
    /// Returns the number of bytes written.
    async fn write(&self, path: &CanonicalPath, data: Bytes) -> AppResult<u64>;

    /// Read a file and return its byte stream.
    async fn read(&self, path: &CanonicalPath) -> AppResult<ByteStream>;

    /// Permanently remove a file or directory tree.
    async fn remove(&self, path: &CanonicalPath) -> AppResult<()>;
}
