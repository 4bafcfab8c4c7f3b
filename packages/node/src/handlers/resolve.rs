//! Graph-or-blob resolution of a target IRI.

use ldp::Graph;

use crate::storage::AccessContext;

use super::AppState;

/// What an IRI names, as far as the graph store is concerned.
#[derive(Debug)]
pub enum Resolved {
    /// The IRI names a graph. An empty graph still counts.
    Graph(Graph),
    /// Not a graph; the IRI is a candidate blob.
    Absent,
}

/// Ask the graph store whether `iri` names a graph.
///
/// A store error is logged and treated as [`Resolved::Absent`], sending
/// the request down the blob path. Each handler calls this itself; the
/// answer is never cached across requests.
pub async fn resolve(state: &AppState, iri: &str, access: &AccessContext) -> Resolved {
    match state.graphs.graph(iri, access).await {
        Ok(Some(graph)) => Resolved::Graph(graph),
        Ok(None) => Resolved::Absent,
        Err(e) => {
            tracing::warn!(%iri, error = %e, "graph lookup failed; treating as absent");
            Resolved::Absent
        }
    }
}
