//! `ldp-node`: a Linked Data Platform resource server.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory node on the default port:
//! ldp-node
//!
//! # Durable graphs and blobs:
//! LDP_GRAPH_DB=./graphs.db LDP_BLOB_DIR=./blobs ldp-node
//!
//! # Public base IRI and bind address:
//! LDP_BASE_IRI=https://data.example.com LDP_BIND=0.0.0.0:8080 ldp-node
//! ```
//!
//! # Environment variables
//!
//! See [`ldp_node::NodeConfig`] for the full list.

use std::sync::Arc;

use ldp_node::{
    build_router, AppState, BlobStore, FsBlobStore, GraphStore, MemoryBlobStore,
    MemoryGraphStore, NodeConfig, SqliteGraphStore,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ldp_node=info,tower_http=debug".into()),
        )
        .init();

    let config = NodeConfig::from_env();

    let graphs: Arc<dyn GraphStore> = match &config.graph_db {
        Some(path) => {
            tracing::info!("graphs: SQLite at {path}");
            Arc::new(
                SqliteGraphStore::open(path)
                    .unwrap_or_else(|e| panic!("failed to open SQLite database at {path}: {e}")),
            )
        }
        None => {
            tracing::info!("graphs: in-memory (data will not survive restart)");
            Arc::new(MemoryGraphStore::new())
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.blob_dir {
        Some(dir) => {
            tracing::info!("blobs: filesystem at {}", dir.display());
            Arc::new(FsBlobStore::new(dir).await.unwrap_or_else(|e| {
                panic!("failed to open blob directory {}: {e}", dir.display())
            }))
        }
        None => {
            tracing::info!("blobs: in-memory (data will not survive restart)");
            Arc::new(MemoryBlobStore::new())
        }
    };

    let bind_addr = config.bind_addr;
    tracing::info!(base_iri = %config.base_iri, "serving resources");
    let app = build_router(AppState::new(graphs, blobs, config));

    tracing::info!("listening on {bind_addr}");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    axum::serve(listener, app).await.expect("server error");
}
