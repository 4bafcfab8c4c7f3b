//! Local filesystem blob store.
//!
//! Each blob lives at `root/<authority>/<decoded path>`. Reads stream the
//! file in chunks; uploads go to a temporary sibling file that is renamed
//! into place on [`BlobUpload::finish`].

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use super::{blob_key, BlobStore, BlobUpload, ByteStream, StorageError};

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Filesystem implementation of [`BlobStore`].
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create the store, creating `root` if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Full path for `iri`. Rejects keys that would leave the root.
    fn blob_path(&self, iri: &str) -> Result<PathBuf, StorageError> {
        let key = blob_key(iri);
        let relative = Path::new(&key);
        if key.ends_with('/') || relative.file_name().is_none() {
            return Err(StorageError::InvalidKey(format!("no file name in {iri}")));
        }
        for component in relative.components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey(format!(
                    "unsafe path component in {iri}"
                )));
            }
        }
        Ok(self.root.join(relative))
    }
}

fn not_found_or_io(e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn read_stream(&self, iri: &str) -> Result<ByteStream, StorageError> {
        let path = self.blob_path(iri)?;
        let file = fs::File::open(&path).await.map_err(not_found_or_io)?;
        let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE).map_err(StorageError::Io);
        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn create_upload(&self, iri: &str) -> Result<Box<dyn BlobUpload>, StorageError> {
        let path = self.blob_path(iri)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Unique temp name so concurrent uploads to one IRI never share a file.
        let temp_name = format!(".tmp.{}", Uuid::new_v4());
        let temp_path = path.with_file_name(
            path.file_name()
                .map(|n| format!("{}{}", n.to_string_lossy(), temp_name))
                .unwrap_or_else(|| temp_name.clone()),
        );
        let file = fs::File::create(&temp_path).await?;

        Ok(Box::new(FsUpload {
            file,
            temp_path,
            final_path: path,
            bytes_written: 0,
        }))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, iri: &str) -> Result<bool, StorageError> {
        let path = match self.blob_path(iri) {
            Ok(path) => path,
            // A key with no file name can never hold a blob.
            Err(StorageError::InvalidKey(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn remove(&self, iri: &str) -> Result<(), StorageError> {
        let path = self.blob_path(iri)?;
        fs::remove_file(&path).await.map_err(not_found_or_io)
    }

    fn iri_to_path(&self, iri: &str) -> String {
        self.root.join(blob_key(iri)).to_string_lossy().into_owned()
    }
}

struct FsUpload {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

#[async_trait]
impl BlobUpload for FsUpload {
    async fn write(&mut self, data: Bytes) -> Result<(), StorageError> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64, StorageError> {
        let FsUpload {
            file,
            temp_path,
            final_path,
            bytes_written,
        } = *self;
        let committed = async {
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &final_path).await
        }
        .await;
        if let Err(e) = committed {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                tracing::warn!(path = %temp_path.display(), error = %cleanup, "remove partial upload");
            }
            return Err(e.into());
        }
        Ok(bytes_written)
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        let FsUpload {
            file, temp_path, ..
        } = *self;
        drop(file);
        fs::remove_file(&temp_path).await.map_err(not_found_or_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    async fn put(store: &FsBlobStore, iri: &str, data: &'static [u8]) {
        let mut up = store.create_upload(iri).await.unwrap();
        up.write(Bytes::from_static(data)).await.unwrap();
        up.finish().await.unwrap();
    }

    #[tokio::test]
    async fn upload_then_stream_back() {
        let (_dir, s) = store().await;
        put(&s, "http://localhost/files/a.txt", b"hello").await;
        assert!(s.exists("http://localhost/files/a.txt").await.unwrap());

        let chunks: Vec<Bytes> = s
            .read_stream("http://localhost/files/a.txt")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello");
    }

    #[tokio::test]
    async fn aborted_upload_is_invisible() {
        let (_dir, s) = store().await;
        let mut up = s.create_upload("http://localhost/b.bin").await.unwrap();
        up.write(Bytes::from_static(b"x")).await.unwrap();
        up.abort().await.unwrap();
        assert!(!s.exists("http://localhost/b.bin").await.unwrap());
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (_dir, s) = store().await;
        assert!(matches!(
            s.read_stream("http://localhost/none").await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            s.remove("http://localhost/none").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (_dir, s) = store().await;
        assert!(matches!(
            s.create_upload("http://localhost/a/%2E%2E/%2E%2E/escape").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn container_iri_is_never_a_blob() {
        let (_dir, s) = store().await;
        assert!(!s.exists("http://localhost/c/").await.unwrap());
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let (_dir, s) = store().await;
        put(&s, "http://localhost/r.bin", b"data").await;
        s.remove("http://localhost/r.bin").await.unwrap();
        assert!(!s.exists("http://localhost/r.bin").await.unwrap());
    }

    #[test]
    fn iri_to_path_keeps_extension() {
        let s = FsBlobStore {
            root: PathBuf::from("/srv/files"),
        };
        assert_eq!(
            s.iri_to_path("http://localhost/img/logo.png"),
            "/srv/files/localhost/img/logo.png"
        );
    }
}
