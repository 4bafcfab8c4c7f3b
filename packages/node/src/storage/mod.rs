//! Collaborator contracts for the two kinds of backing resource.
//!
//! The HTTP layer never persists anything itself. It asks a [`GraphStore`]
//! whether an IRI names an RDF graph and, when it does not, treats the IRI
//! as a candidate blob in a [`BlobStore`]. Both stores share one IRI space.
//!
//! Stores impose their own concurrency rules. The handlers call each store
//! operation once per request phase and act on its single result; there is
//! no locking or transaction across calls.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryGraphStore`] / [`MemoryBlobStore`] | Tests, conformance suite, ephemeral nodes |
//! | [`SqliteGraphStore`] | Durable graphs in a single-file database |
//! | [`FsBlobStore`] | Durable blobs as plain files under a root directory |
//!
//! [`MemoryGraphStore`]: memory::MemoryGraphStore
//! [`MemoryBlobStore`]: memory::MemoryBlobStore
//! [`SqliteGraphStore`]: sqlite::SqliteGraphStore
//! [`FsBlobStore`]: fs::FsBlobStore

pub mod fs;
pub mod memory;
pub mod sqlite;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use ldp::Graph;

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that store operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing is stored under the IRI.
    #[error("not found")]
    NotFound,

    /// The IRI cannot be mapped onto the backend (e.g. path traversal).
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Filesystem or stream I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// A boxed stream of blob bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

// ---------------------------------------------------------------------------
// AccessContext
// ---------------------------------------------------------------------------

/// Who is asking, threaded through to the graph store untouched.
///
/// Authorization decisions, if any, belong to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    pub agent: Option<String>,
    pub application: Option<String>,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// RDF graphs keyed by IRI.
///
/// `None` results are the store's way of saying "no": the handlers decide
/// what HTTP condition that becomes.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    /// The graph stored at `iri`, or `None` if the IRI does not name a graph.
    /// An empty graph is still `Some`.
    async fn graph(&self, iri: &str, ctx: &AccessContext) -> Result<Option<Graph>, StorageError>;

    /// Create or replace the graph at `iri`. Returns the stored graph, or
    /// `None` if the store refused.
    async fn add(
        &self,
        iri: &str,
        graph: Graph,
        ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError>;

    /// Union `graph` into the graph at `iri`. Returns the merged graph, or
    /// `None` if the store refused.
    async fn merge(
        &self,
        iri: &str,
        graph: Graph,
        ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError>;

    /// Remove the graph at `iri`. Returns `false` if nothing was removed.
    async fn delete(&self, iri: &str, ctx: &AccessContext) -> Result<bool, StorageError>;
}

// ---------------------------------------------------------------------------
// BlobStore
// ---------------------------------------------------------------------------

/// Opaque byte streams keyed by IRI.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Open the blob for reading. Returns [`StorageError::NotFound`] if it
    /// does not exist.
    async fn read_stream(&self, iri: &str) -> Result<ByteStream, StorageError>;

    /// Start writing the blob at `iri`. Nothing becomes visible until
    /// [`BlobUpload::finish`] succeeds.
    async fn create_upload(&self, iri: &str) -> Result<Box<dyn BlobUpload>, StorageError>;

    async fn exists(&self, iri: &str) -> Result<bool, StorageError>;

    /// Delete the blob. Returns [`StorageError::NotFound`] if it does not exist.
    async fn remove(&self, iri: &str) -> Result<(), StorageError>;

    /// Storage path for `iri`; only its file extension is used, for
    /// media-type lookup.
    fn iri_to_path(&self, iri: &str) -> String {
        blob_key(iri)
    }
}

/// An in-progress blob write.
#[async_trait]
pub trait BlobUpload: Send {
    async fn write(&mut self, data: Bytes) -> Result<(), StorageError>;

    /// Commit the blob. Returns the number of bytes written. On error the
    /// partial data is discarded and nothing becomes visible.
    async fn finish(self: Box<Self>) -> Result<u64, StorageError>;

    /// Discard everything written so far.
    async fn abort(self: Box<Self>) -> Result<(), StorageError>;
}

/// Map an IRI onto a relative storage key: `authority/decoded/path`.
///
/// Query and fragment are dropped. The result may still contain unsafe
/// components; backends that touch a filesystem must validate it.
pub fn blob_key(iri: &str) -> String {
    let without_fragment = iri.split('#').next().unwrap_or(iri);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    let rest = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let path = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());
    format!("{authority}/{path}")
}
