//! SQLite-backed graph store.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `graphs`: one row per IRI, the graph stored as N-Triples text.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use ldp::codec::{NTriplesCodec, Parser, Serializer};
use ldp::Graph;
use rusqlite::{params, Connection, OptionalExtension};

use super::{AccessContext, GraphStore, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS graphs (
    iri   TEXT PRIMARY KEY,
    data  TEXT NOT NULL
);
";

/// SQLite-backed implementation of [`GraphStore`].
///
/// Holds a single database connection protected by a `Mutex`. Merges are a
/// read-modify-write under that mutex, so they are atomic per node process.
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

fn encode(iri: &str, graph: &Graph) -> Result<String, StorageError> {
    let bytes = NTriplesCodec
        .serialize(graph, iri)
        .map_err(|e| StorageError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Internal(e.to_string()))
}

fn decode(iri: &str, data: &str) -> Result<Graph, StorageError> {
    NTriplesCodec
        .parse(data.as_bytes(), iri)
        .map_err(|e| StorageError::Internal(format!("corrupt graph {iri}: {e}")))
}

fn load(conn: &Connection, iri: &str) -> Result<Option<Graph>, StorageError> {
    conn.query_row(
        "SELECT data FROM graphs WHERE iri = ?1",
        params![iri],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(map_err)?
    .map(|data| decode(iri, &data))
    .transpose()
}

fn store(conn: &Connection, iri: &str, graph: &Graph) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO graphs (iri, data) VALUES (?1, ?2)
         ON CONFLICT(iri) DO UPDATE SET data = excluded.data",
        params![iri, encode(iri, graph)?],
    )
    .map_err(map_err)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// GraphStore impl
// ---------------------------------------------------------------------------

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn graph(&self, iri: &str, _ctx: &AccessContext) -> Result<Option<Graph>, StorageError> {
        let iri = iri.to_string();
        self.with_conn(move |conn| load(conn, &iri)).await
    }

    async fn add(
        &self,
        iri: &str,
        graph: Graph,
        _ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        let iri = iri.to_string();
        self.with_conn(move |conn| {
            store(conn, &iri, &graph)?;
            Ok(Some(graph))
        })
        .await
    }

    async fn merge(
        &self,
        iri: &str,
        graph: Graph,
        _ctx: &AccessContext,
    ) -> Result<Option<Graph>, StorageError> {
        let iri = iri.to_string();
        self.with_conn(move |conn| {
            let mut merged = load(conn, &iri)?.unwrap_or_default();
            merged.merge(&graph);
            store(conn, &iri, &merged)?;
            Ok(Some(merged))
        })
        .await
    }

    async fn delete(&self, iri: &str, _ctx: &AccessContext) -> Result<bool, StorageError> {
        let iri = iri.to_string();
        self.with_conn(move |conn| {
            let removed = conn
                .execute("DELETE FROM graphs WHERE iri = ?1", params![iri])
                .map_err(map_err)?;
            Ok(removed > 0)
        })
        .await
    }
}
