//! Local filesystem storage gateway.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;

use orgdrive_core::error::{AppError, ErrorKind};
use orgdrive_core::result::AppResult;
use orgdrive_core::traits::storage::{ByteStream, ItemMeta, StorageGateway};
use orgdrive_core::types::path::CanonicalPath;

/// Storage gateway rooted at a single local directory.
///
/// Every canonical path is joined against the root after traversal checks;
/// a path that would resolve outside the root is rejected, never clamped.
#[derive(Debug, Clone)]
pub struct LocalGateway {
    /// Root directory as configured.
    root: PathBuf,
    /// Canonicalized root, used for symlink-escape verification.
    real_root: PathBuf,
}

impl LocalGateway {
    /// Create a new gateway rooted at the given path, creating it if absent.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        let real_root = fs::canonicalize(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root, real_root })
    }

    /// Join a canonical path against the root, rejecting `..` segments.
    fn resolve(&self, path: &CanonicalPath) -> AppResult<PathBuf> {
        for segment in path.segments() {
            if segment == ".." {
                return Err(AppError::validation(format!(
                    "Path escapes storage root: {path}"
                )));
            }
        }
        Ok(self.root.join(path.as_str()))
    }

    /// Verify that the deepest existing ancestor of `full` resolves under
    /// the storage root, so a symlink planted inside the tree cannot reach
    /// outside it.
    async fn confine(&self, full: &Path, original: &CanonicalPath) -> AppResult<()> {
        let mut probe = full.to_path_buf();
        loop {
            match fs::symlink_metadata(&probe).await {
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if !probe.pop() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to probe path: {original}"),
                        e,
                    ));
                }
            }
        }
        let real = fs::canonicalize(&probe).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve path: {original}"),
                e,
            )
        })?;
        if !real.starts_with(&self.real_root) {
            return Err(AppError::validation(format!(
                "Path escapes storage root: {original}"
            )));
        }
        Ok(())
    }

    async fn resolve_confined(&self, path: &CanonicalPath) -> AppResult<PathBuf> {
        let full = self.resolve(path)?;
        self.confine(&full, path).await?;
        Ok(full)
    }

    async fn ensure_parent(&self, full: &Path) -> AppResult<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Copy+delete fallback for moves that cross filesystem boundaries.
    ///
    /// A failure after a partial copy removes the truncated destination so
    /// it can never be observed or registered.
    async fn copy_fallback(
        &self,
        src_full: &Path,
        dst_full: &Path,
        is_directory: bool,
        src: &CanonicalPath,
        dst: &CanonicalPath,
    ) -> AppResult<()> {
        let copied = if is_directory {
            copy_dir_recursive(src_full, dst_full).await
        } else {
            fs::copy(src_full, dst_full).await.map(|_| ())
        };

        if let Err(e) = copied {
            if is_directory {
                let _ = fs::remove_dir_all(dst_full).await;
            } else {
                let _ = fs::remove_file(dst_full).await;
            }
            return Err(AppError::with_source(
                ErrorKind::CrossDeviceMove,
                format!("Cross-device move failed copying {src} -> {dst}"),
                e,
            ));
        }

        let removed = if is_directory {
            fs::remove_dir_all(src_full).await
        } else {
            fs::remove_file(src_full).await
        };
        removed.map_err(|e| {
            AppError::with_source(
                ErrorKind::CrossDeviceMove,
                format!("Cross-device move copied {src} -> {dst} but failed to remove the source"),
                e,
            )
        })?;

        debug!(%src, %dst, "Moved item across devices via copy fallback");
        Ok(())
    }

    fn meta_from(&self, path: &CanonicalPath, meta: &std::fs::Metadata) -> ItemMeta {
        ItemMeta {
            path: path.clone(),
            name: path.file_name().unwrap_or_default().to_string(),
            size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            is_directory: meta.is_dir(),
            modified: meta
                .modified()
                .ok()
                .map(chrono::DateTime::<chrono::Utc>::from),
        }
    }
}

#[async_trait]
impl StorageGateway for LocalGateway {
    async fn ensure_dir(&self, path: &CanonicalPath) -> AppResult<()> {
        let full = self.resolve_confined(path).await?;
        fs::create_dir_all(&full).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {path}"),
                e,
            )
        })
    }

    async fn exists(&self, path: &CanonicalPath) -> AppResult<bool> {
        let full = self.resolve_confined(path).await?;
        match fs::metadata(&full).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to stat: {path}"),
                e,
            )),
        }
    }

    async fn stat(&self, path: &CanonicalPath) -> AppResult<ItemMeta> {
        let full = self.resolve_confined(path).await?;
        let meta = fs::metadata(&full).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AppError::not_found(format!("Path not found: {path}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to stat: {path}"), e)
            }
        })?;
        Ok(self.meta_from(path, &meta))
    }

    async fn list(&self, path: &CanonicalPath) -> AppResult<Vec<ItemMeta>> {
        let full = self.resolve_confined(path).await?;

        let mut dir = match fs::read_dir(&full).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list directory: {path}"),
                    e,
                ));
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let name = entry.file_name().to_string_lossy().to_string();
            // Dot-prefixed names hold quarantine and staging areas.
            if name.starts_with('.') {
                continue;
            }
            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to stat directory entry", e)
            })?;
            entries.push(self.meta_from(&path.join(&name), &meta));
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    async fn move_item(
        &self,
        src: &CanonicalPath,
        dst: &CanonicalPath,
        overwrite: bool,
    ) -> AppResult<()> {
        let src_full = self.resolve_confined(src).await?;
        let dst_full = self.resolve_confined(dst).await?;

        let src_meta = fs::symlink_metadata(&src_full).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AppError::not_found(format!("Path not found: {src}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to stat: {src}"), e)
            }
        })?;

        match fs::symlink_metadata(&dst_full).await {
            Ok(existing) => {
                if !overwrite || existing.is_dir() {
                    return Err(AppError::already_exists(format!(
                        "Destination already exists: {dst}"
                    )));
                }
                fs::remove_file(&dst_full).await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to replace destination: {dst}"),
                        e,
                    )
                })?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to stat destination: {dst}"),
                    e,
                ));
            }
        }

        self.ensure_parent(&dst_full).await?;

        match fs::rename(&src_full, &dst_full).await {
            Ok(()) => {
                debug!(%src, %dst, "Moved item");
                Ok(())
            }
            // Source vanished between stat and rename: a concurrent delete
            // won the race. The filesystem is the source of truth.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("Path not found: {src}")))
            }
            Err(e) if is_cross_device(&e) => {
                self.copy_fallback(&src_full, &dst_full, src_meta.is_dir(), src, dst)
                    .await
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to move {src} -> {dst}"),
                e,
            )),
        }
    }

    async fn write(&self, path: &CanonicalPath, data: Bytes) -> AppResult<u64> {
        let full = self.resolve_confined(path).await?;
        self.ensure_parent(&full).await?;

        fs::write(&full, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {path}"),
                e,
            )
        })?;

        debug!(%path, bytes = data.len(), "Wrote file");
        Ok(data.len() as u64)
    }

    async fn read(&self, path: &CanonicalPath) -> AppResult<ByteStream> {
        let full = self.resolve_confined(path).await?;
        let file = fs::File::open(&full).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {path}"),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(|b| b.into()))))
    }

    async fn remove(&self, path: &CanonicalPath) -> AppResult<()> {
        let full = self.resolve_confined(path).await?;
        let meta = fs::symlink_metadata(&full).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AppError::not_found(format!("Path not found: {path}"))
            } else {
                AppError::with_source(ErrorKind::Storage, format!("Failed to stat: {path}"), e)
            }
        })?;

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&full).await
        } else {
            fs::remove_file(&full).await
        };
        removed.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to remove: {path}"), e)
        })
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
}

fn copy_dir_recursive<'a>(
    src: &'a Path,
    dst: &'a Path,
) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        fs::create_dir_all(dst).await?;
        let mut dir = fs::read_dir(src).await?;
        while let Some(entry) = dir.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                copy_dir_recursive(&entry.path(), &target).await?;
            } else {
                fs::copy(entry.path(), &target).await?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gateway() -> (tempfile::TempDir, LocalGateway) {
        let dir = tempfile::tempdir().unwrap();
        let gw = LocalGateway::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, gw)
    }

    async fn read_all(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    fn p(s: &str) -> CanonicalPath {
        CanonicalPath::parse(s)
    }

    #[tokio::test]
    async fn test_write_stat_read_remove() {
        let (_dir, gw) = gateway().await;
        let path = p("docs/hello.txt");

        gw.write(&path, Bytes::from("hello world")).await.unwrap();
        let meta = gw.stat(&path).await.unwrap();
        assert_eq!(meta.size_bytes, 11);
        assert!(!meta.is_directory);

        let content = read_all(gw.read(&path).await.unwrap()).await;
        assert_eq!(content, b"hello world");

        gw.remove(&path).await.unwrap();
        assert!(!gw.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_parent_traversal() {
        let (_dir, gw) = gateway().await;
        let err = gw.stat(&p("../outside.txt")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_escape() {
        let (dir, gw) = gateway().await;
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("leak")).unwrap();

        let err = gw.stat(&p("leak/secret.txt")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_move_missing_source_is_not_found() {
        let (_dir, gw) = gateway().await;
        let err = gw
            .move_item(&p("ghost.txt"), &p("elsewhere.txt"), false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_move_refuses_existing_destination() {
        let (_dir, gw) = gateway().await;
        gw.write(&p("a.txt"), Bytes::from("a")).await.unwrap();
        gw.write(&p("b.txt"), Bytes::from("b")).await.unwrap();

        let err = gw
            .move_item(&p("a.txt"), &p("b.txt"), false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);

        // With overwrite the move replaces the file.
        gw.move_item(&p("a.txt"), &p("b.txt"), true).await.unwrap();
        let content = read_all(gw.read(&p("b.txt")).await.unwrap()).await;
        assert_eq!(content, b"a");
    }

    #[tokio::test]
    async fn test_move_directory_tree() {
        let (_dir, gw) = gateway().await;
        gw.write(&p("src/nested/file.txt"), Bytes::from("x"))
            .await
            .unwrap();

        gw.move_item(&p("src"), &p("dst"), false).await.unwrap();
        assert!(!gw.exists(&p("src")).await.unwrap());
        assert!(gw.exists(&p("dst/nested/file.txt")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_hides_dot_entries_and_sorts_dirs_first() {
        let (_dir, gw) = gateway().await;
        gw.write(&p("folder/z.txt"), Bytes::from("z")).await.unwrap();
        gw.ensure_dir(&p("folder/sub")).await.unwrap();
        gw.write(&p("folder/.recycle/hidden"), Bytes::from("h"))
            .await
            .unwrap();

        let entries = gw.list(&p("folder")).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "z.txt"]);
        assert!(entries[0].is_directory);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let (_dir, gw) = gateway().await;
        assert!(gw.list(&p("nowhere")).await.unwrap().is_empty());
    }
}
