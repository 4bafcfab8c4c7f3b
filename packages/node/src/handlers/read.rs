//! `GET` and `HEAD`.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use ldp::Graph;

use crate::error::LdpError;

use super::{
    resolve::{resolve, Resolved},
    AppState, RequestContext,
};

/// Serve the graph or blob at the request IRI.
pub async fn get(state: &AppState, ctx: &RequestContext) -> Result<Response, LdpError> {
    match resolve(state, &ctx.iri, &ctx.access).await {
        Resolved::Graph(graph) => get_graph(state, ctx, &graph),
        Resolved::Absent => get_blob(state, ctx).await,
    }
}

fn get_graph(state: &AppState, ctx: &RequestContext, graph: &Graph) -> Result<Response, LdpError> {
    tracing::debug!(iri = %ctx.iri, triples = graph.len(), "serving graph");

    let mime = state
        .codecs
        .accepts_serializer(ctx.header(header::ACCEPT))
        .or_else(|| state.config.default_type.clone())
        .ok_or(LdpError::NotAcceptable)?;
    let serializer = state
        .codecs
        .serializer(&mime)
        .ok_or(LdpError::NotAcceptable)?;
    let data = serializer
        .serialize(graph, &ctx.iri)
        .map_err(|e| LdpError::InternalServerError.logged("serialize graph", e))?;

    let body = if ctx.skip_body() {
        Body::empty()
    } else {
        Body::from(data)
    };
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, mime)], body).into_response())
}

async fn get_blob(state: &AppState, ctx: &RequestContext) -> Result<Response, LdpError> {
    let stream = state.blobs.read_stream(&ctx.iri).await.map_err(|e| {
        tracing::debug!(iri = %ctx.iri, error = %e, "no blob");
        LdpError::NotFound
    })?;

    let mime = mime_guess::from_path(state.blobs.iri_to_path(&ctx.iri)).first_or_octet_stream();
    let body = if ctx.skip_body() {
        Body::empty()
    } else {
        // The status is already committed once bytes flow; a failure here
        // can only cut the body short.
        let iri = ctx.iri.clone();
        Body::from_stream(stream.inspect_err(move |e| {
            tracing::warn!(%iri, error = %e, "blob stream failed mid-transfer");
        }))
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.essence_str().to_string())],
        body,
    )
        .into_response())
}
