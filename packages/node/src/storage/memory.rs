//! In-memory store implementations.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use these for tests, the conformance suite, and ephemeral nodes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use ldp::Graph;

use super::{
    blob_key, AccessContext, BlobStore, BlobUpload, ByteStream, GraphStore, StorageError,
};

// ---------------------------------------------------------------------------
// MemoryGraphStore
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`GraphStore`].
///
/// Never refuses: `add` replaces, `merge` creates the graph when absent.
#[derive(Default)]
pub struct MemoryGraphStore {
    graphs: RwLock<HashMap<String, Graph>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored graphs.
    pub fn len(&self) -> usize {
        self.graphs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn graph(&self, iri: &str, _ctx: &AccessContext) -> Result<Option<Graph>, StorageError> {
        let graphs = self.graphs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(graphs.get(iri).cloned())
    }

    async fn add(
        &self,
        iri: &str,
        graph: Graph,
        _ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        let mut graphs = self.graphs.write().unwrap_or_else(PoisonError::into_inner);
        graphs.insert(iri.to_string(), graph.clone());
        Ok(Some(graph))
    }

    async fn merge(
        &self,
        iri: &str,
        graph: Graph,
        _ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        let mut graphs = self.graphs.write().unwrap_or_else(PoisonError::into_inner);
        let merged = graphs.entry(iri.to_string()).or_default();
        merged.merge(&graph);
        Ok(Some(merged.clone()))
    }

    async fn delete(&self, iri: &str, _ctx: &AccessContext) -> Result<bool, StorageError> {
        let mut graphs = self.graphs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(graphs.remove(iri).is_some())
    }
}

// ---------------------------------------------------------------------------
// MemoryBlobStore
// ---------------------------------------------------------------------------

type BlobMap = Arc<RwLock<HashMap<String, Bytes>>>;

/// Thread-safe, in-memory implementation of [`BlobStore`], keyed by
/// [`blob_key`].
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: BlobMap,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `iri` directly, bypassing the upload protocol.
    pub fn insert(&self, iri: &str, data: impl Into<Bytes>) {
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(blob_key(iri), data.into());
    }

    /// The full contents of the blob at `iri`, if any.
    pub fn get(&self, iri: &str) -> Option<Bytes> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&blob_key(iri))
            .cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read_stream(&self, iri: &str) -> Result<ByteStream, StorageError> {
        let data = self.get(iri).ok_or(StorageError::NotFound)?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, StorageError>(data)
        })))
    }

    async fn create_upload(&self, iri: &str) -> Result<Box<dyn BlobUpload>, StorageError> {
        Ok(Box::new(MemoryUpload {
            blobs: Arc::clone(&self.blobs),
            key: blob_key(iri),
            buf: BytesMut::new(),
        }))
    }

    async fn exists(&self, iri: &str) -> Result<bool, StorageError> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.contains_key(&blob_key(iri)))
    }

    async fn remove(&self, iri: &str) -> Result<(), StorageError> {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs
            .remove(&blob_key(iri))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

struct MemoryUpload {
    blobs: BlobMap,
    key: String,
    buf: BytesMut,
}

#[async_trait]
impl BlobUpload for MemoryUpload {
    async fn write(&mut self, data: Bytes) -> Result<(), StorageError> {
        self.buf.extend_from_slice(&data);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<u64, StorageError> {
        let MemoryUpload { blobs, key, buf } = *self;
        let len = buf.len() as u64;
        blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, buf.freeze());
        Ok(len)
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
