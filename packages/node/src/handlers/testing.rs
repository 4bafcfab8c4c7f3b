//! Helpers shared by the handler tests: an in-memory node driven through
//! the full router with `oneshot`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{request::Builder, Method, Request},
    response::Response,
    Router,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use ldp::Graph;
use tower::ServiceExt;

use crate::{
    config::NodeConfig,
    handlers::AppState,
    router::build_router,
    storage::{
        memory::{MemoryBlobStore, MemoryGraphStore},
        AccessContext, BlobStore, BlobUpload, ByteStream, GraphStore, StorageError,
    },
};

pub(crate) const TURTLE_DOC: &str =
    "<http://localhost/doc> <http://purl.org/dc/terms/title> \"Hello\" .\n";

/// How the wrapped graph store behaves on writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum WriteMode {
    #[default]
    Accept,
    /// `add`/`merge` answer `Ok(None)`.
    Refuse,
    /// Every call answers `Err`.
    Fail,
}

/// A [`MemoryGraphStore`] that remembers the last access context and can be
/// told to refuse or fail.
#[derive(Default)]
pub(crate) struct RecordingGraphStore {
    inner: MemoryGraphStore,
    mode: WriteMode,
    last_access: Mutex<Option<AccessContext>>,
}

impl RecordingGraphStore {
    fn record(&self, ctx: &AccessContext) -> Result<(), StorageError> {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ctx.clone());
        match self.mode {
            WriteMode::Fail => Err(StorageError::Internal("store offline".into())),
            _ => Ok(()),
        }
    }

    pub(crate) fn last_access(&self) -> Option<AccessContext> {
        self.last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GraphStore for RecordingGraphStore {
    async fn graph(&self, iri: &str, ctx: &AccessContext) -> Result<Option<Graph>, StorageError> {
        self.record(ctx)?;
        self.inner.graph(iri, ctx).await
    }

    async fn add(
        &self,
        iri: &str,
        graph: Graph,
        ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        self.record(ctx)?;
        if self.mode == WriteMode::Refuse {
            return Ok(None);
        }
        self.inner.add(iri, graph, ctx).await
    }

    async fn merge(
        &self,
        iri: &str,
        graph: Graph,
        ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        self.record(ctx)?;
        if self.mode == WriteMode::Refuse {
            return Ok(None);
        }
        self.inner.merge(iri, graph, ctx).await
    }

    async fn delete(&self, iri: &str, ctx: &AccessContext) -> Result<bool, StorageError> {
        self.record(ctx)?;
        self.inner.delete(iri, ctx).await
    }
}

/// Which blob store call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum BlobFault {
    #[default]
    None,
    Exists,
    Remove,
    /// `read_stream` yields the stored bytes, then an error.
    ReadMidStream,
    /// Every `BlobUpload::write` fails.
    Write,
    /// `BlobUpload::finish` discards the upload and fails.
    Finish,
}

fn offline() -> StorageError {
    StorageError::Internal("blob store offline".into())
}

/// A [`MemoryBlobStore`] that fails one kind of call and remembers aborted
/// uploads.
pub(crate) struct FaultyBlobStore {
    inner: Arc<MemoryBlobStore>,
    fault: BlobFault,
    aborted: Arc<AtomicBool>,
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn read_stream(&self, iri: &str) -> Result<ByteStream, StorageError> {
        let stream = self.inner.read_stream(iri).await?;
        if self.fault != BlobFault::ReadMidStream {
            return Ok(stream);
        }
        let failure = futures::stream::once(async { Err(offline()) });
        Ok(Box::pin(futures::StreamExt::chain(stream, failure)))
    }

    async fn create_upload(&self, iri: &str) -> Result<Box<dyn BlobUpload>, StorageError> {
        Ok(Box::new(FaultyUpload {
            inner: self.inner.create_upload(iri).await?,
            fault: self.fault,
            aborted: Arc::clone(&self.aborted),
        }))
    }

    async fn exists(&self, iri: &str) -> Result<bool, StorageError> {
        if self.fault == BlobFault::Exists {
            return Err(offline());
        }
        self.inner.exists(iri).await
    }

    async fn remove(&self, iri: &str) -> Result<(), StorageError> {
        if self.fault == BlobFault::Remove {
            return Err(offline());
        }
        self.inner.remove(iri).await
    }
}

struct FaultyUpload {
    inner: Box<dyn BlobUpload>,
    fault: BlobFault,
    aborted: Arc<AtomicBool>,
}

#[async_trait]
impl BlobUpload for FaultyUpload {
    async fn write(&mut self, data: Bytes) -> Result<(), StorageError> {
        if self.fault == BlobFault::Write {
            return Err(offline());
        }
        self.inner.write(data).await
    }

    async fn finish(self: Box<Self>) -> Result<u64, StorageError> {
        if self.fault == BlobFault::Finish {
            self.aborted.store(true, Ordering::SeqCst);
            self.inner.abort().await?;
            return Err(offline());
        }
        self.inner.finish().await
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        self.aborted.store(true, Ordering::SeqCst);
        self.inner.abort().await
    }
}

pub(crate) struct TestNode {
    pub recorder: Arc<RecordingGraphStore>,
    pub blobs: Arc<MemoryBlobStore>,
    aborted: Arc<AtomicBool>,
    router: Router,
}

impl TestNode {
    pub(crate) fn new() -> Self {
        Self::build(WriteMode::Accept, BlobFault::None, NodeConfig::default())
    }

    pub(crate) fn with_mode(mode: WriteMode) -> Self {
        Self::build(mode, BlobFault::None, NodeConfig::default())
    }

    pub(crate) fn with_blob_fault(fault: BlobFault) -> Self {
        Self::build(WriteMode::Accept, fault, NodeConfig::default())
    }

    pub(crate) fn with_config(config: NodeConfig) -> Self {
        Self::build(WriteMode::Accept, BlobFault::None, config)
    }

    fn build(mode: WriteMode, fault: BlobFault, config: NodeConfig) -> Self {
        let recorder = Arc::new(RecordingGraphStore {
            mode,
            ..Default::default()
        });
        let blobs = Arc::new(MemoryBlobStore::new());
        let aborted = Arc::new(AtomicBool::new(false));
        let store = Arc::new(FaultyBlobStore {
            inner: Arc::clone(&blobs),
            fault,
            aborted: Arc::clone(&aborted),
        });
        let state = AppState::new(recorder.clone(), store, config);
        Self {
            recorder,
            blobs,
            aborted,
            router: build_router(state),
        }
    }

    /// Whether any blob upload was aborted.
    pub(crate) fn upload_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub(crate) async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Read a graph straight from the backing store.
    pub(crate) async fn graph(&self, iri: &str) -> Option<Graph> {
        self.recorder
            .inner
            .graph(iri, &AccessContext::default())
            .await
            .unwrap()
    }

    /// Store a graph straight into the backing store.
    pub(crate) async fn seed_graph(&self, iri: &str, graph: Graph) {
        self.recorder
            .inner
            .add(iri, graph, &AccessContext::default())
            .await
            .unwrap();
    }
}

pub(crate) fn request(method: Method, path: &str) -> Builder {
    Request::builder().method(method).uri(path)
}

pub(crate) trait BuilderExt {
    fn empty(self) -> Request<Body>;
}

impl BuilderExt for Builder {
    fn empty(self) -> Request<Body> {
        self.body(Body::empty()).unwrap()
    }
}

pub(crate) async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub(crate) async fn body_string(resp: Response) -> String {
    String::from_utf8(body_bytes(resp).await).unwrap()
}

/// A one-triple graph about `subject`.
pub(crate) fn titled(subject: &str, title: &str) -> Graph {
    [ldp::Triple::new(
        ldp::Term::iri(subject),
        "http://purl.org/dc/terms/title",
        ldp::Term::literal(title),
    )]
    .into_iter()
    .collect()
}
