//! Shared helpers for the LDP conformance test suite.
//!
//! Provides [`spawn_node`], which binds a `TcpListener` on an ephemeral
//! port, wires up an in-process node backed by the in-memory stores, and
//! returns the local URL together with both stores so tests can seed or
//! inspect data without going through the HTTP layer.

use std::path::Path;
use std::sync::Arc;

use ldp_node::{
    build_router, AppState, BlobStore, FsBlobStore, GraphStore, MemoryBlobStore,
    MemoryGraphStore, NodeConfig, SqliteGraphStore,
};

/// A running in-process node.
pub struct TestNode {
    /// Base URL, e.g. `http://127.0.0.1:51234`. Also the node's base IRI.
    pub base_url: String,
    pub graphs: Arc<MemoryGraphStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestNode {
    /// Absolute IRI (and URL) of `path`.
    pub fn iri(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Start an ephemeral in-process node with default configuration.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub async fn spawn_node() -> TestNode {
    spawn_node_with(|_| {}).await
}

/// Like [`spawn_node`], letting the caller adjust the configuration first.
/// `bind_addr` and `base_iri` are always overwritten.
pub async fn spawn_node_with(configure: impl FnOnce(&mut NodeConfig)) -> TestNode {
    let graphs = Arc::new(MemoryGraphStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let base_url = serve(
        Arc::clone(&graphs) as Arc<dyn GraphStore>,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        configure,
    )
    .await;
    TestNode {
        base_url,
        graphs,
        blobs,
    }
}

/// Start a node backed by SQLite and the filesystem under `dir`, and return
/// its base URL.
pub async fn spawn_durable_node(dir: &Path) -> String {
    let db = dir.join("graphs.db");
    let graphs = SqliteGraphStore::open(&db.to_string_lossy()).expect("open SQLite graph store");
    let blobs = FsBlobStore::new(dir.join("blobs"))
        .await
        .expect("open filesystem blob store");
    serve(Arc::new(graphs), Arc::new(blobs), |_| {}).await
}

async fn serve(
    graphs: Arc<dyn GraphStore>,
    blobs: Arc<dyn BlobStore>,
    configure: impl FnOnce(&mut NodeConfig),
) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let mut config = NodeConfig::default();
    configure(&mut config);
    config.bind_addr = addr;
    config.base_iri = base_url.clone();

    let router = build_router(AppState::new(graphs, blobs, config));
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance node error");
    });

    base_url
}
