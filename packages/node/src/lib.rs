//! Public surface for the `ldp-node` crate.
//!
//! Exposes the router builder, state and store types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process node
//! without spawning a subprocess.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod storage;

pub use config::NodeConfig;
pub use error::LdpError;
pub use handlers::AppState;
pub use middleware::invoker::{Invoker, Session};
pub use router::build_router;
pub use storage::{
    fs::FsBlobStore,
    memory::{MemoryBlobStore, MemoryGraphStore},
    sqlite::SqliteGraphStore,
    AccessContext, BlobStore, GraphStore, StorageError,
};
