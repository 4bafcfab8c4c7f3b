//! `PUT`, and `POST` of a non-container resource.
//!
//! A `Content-Type` that matches a registered parser makes the body a graph;
//! anything else (including no `Content-Type` at all) is stored as a blob.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use ldp::{child_iri, Graph, Slug};

use crate::error::LdpError;

use super::{
    resolve::{resolve, Resolved},
    AppState, RequestContext,
};

/// Create or replace the resource at the request IRI.
///
/// An IRI holds a graph or a blob, never both: whichever kind the request
/// does not write is dropped once the new resource is stored.
pub async fn put(state: &AppState, ctx: &RequestContext, body: Body) -> Result<Response, LdpError> {
    match state.codecs.accepts_parser(ctx.header(header::CONTENT_TYPE)) {
        Some(mime) => {
            let graph = parse_body(state, &mime, body, &ctx.iri).await?;
            store_graph(state, ctx, &ctx.iri, graph).await?;
            drop_blob(state, &ctx.iri).await?;
        }
        None => {
            upload_blob(state, &ctx.iri, body).await?;
            drop_graph(state, ctx).await?;
        }
    }
    Ok(StatusCode::CREATED.into_response())
}

/// Remove a blob replaced by a graph.
async fn drop_blob(state: &AppState, iri: &str) -> Result<(), LdpError> {
    let exists = state
        .blobs
        .exists(iri)
        .await
        .map_err(|e| LdpError::InternalServerError.logged("blob exists", e))?;
    if exists {
        state
            .blobs
            .remove(iri)
            .await
            .map_err(|e| LdpError::InternalServerError.logged("blob remove", e))?;
        tracing::debug!(%iri, "graph replaced blob");
    }
    Ok(())
}

/// Remove a graph replaced by a blob.
async fn drop_graph(state: &AppState, ctx: &RequestContext) -> Result<(), LdpError> {
    if let Resolved::Graph(_) = resolve(state, &ctx.iri, &ctx.access).await {
        state
            .graphs
            .delete(&ctx.iri, &ctx.access)
            .await
            .map_err(|e| LdpError::InternalServerError.logged("graph delete", e))?;
        tracing::debug!(iri = %ctx.iri, "blob replaced graph");
    }
    Ok(())
}

/// Create a new resource inside the container at the request IRI.
pub async fn post(state: &AppState, ctx: &RequestContext, body: Body) -> Result<Response, LdpError> {
    let slug = Slug::from_header(ctx.header("slug"));

    match state.codecs.accepts_parser(ctx.header(header::CONTENT_TYPE)) {
        Some(mime) => {
            let slug = slug.with_extension(state.codecs.extension(&mime));
            let child = new_child(state, ctx, slug.as_str()).await?;
            let graph = parse_body(state, &mime, body, &child).await?;
            store_graph(state, ctx, &child, graph).await?;
            Ok(created(child))
        }
        None => {
            let ext = ctx
                .header(header::CONTENT_TYPE)
                .and_then(blob_extension);
            let slug = slug.with_extension(ext);
            let child = new_child(state, ctx, slug.as_str()).await?;
            upload_blob(state, &child, body).await?;
            Ok(created(child))
        }
    }
}

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

/// Resolve `segment` inside the request IRI and make sure neither store
/// already holds it.
pub(super) async fn new_child(
    state: &AppState,
    ctx: &RequestContext,
    segment: &str,
) -> Result<String, LdpError> {
    let child =
        child_iri(&ctx.iri, segment).map_err(|e| LdpError::BadRequest.logged("child IRI", e))?;

    if let Resolved::Graph(_) = resolve(state, &child, &ctx.access).await {
        tracing::debug!(%child, "graph already exists");
        return Err(LdpError::BadRequest);
    }
    match state.blobs.exists(&child).await {
        Ok(false) => Ok(child),
        Ok(true) => {
            tracing::debug!(%child, "blob already exists");
            Err(LdpError::BadRequest)
        }
        Err(e) => Err(LdpError::InternalServerError.logged("blob exists", e)),
    }
}

/// Buffer the whole body and parse it with the parser for `mime`.
pub(super) async fn parse_body(
    state: &AppState,
    mime: &str,
    body: Body,
    base_iri: &str,
) -> Result<Graph, LdpError> {
    let parser = state.codecs.parser(mime).ok_or(LdpError::NotAcceptable)?;
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| LdpError::InternalServerError.logged("read request body", e))?;
    parser
        .parse(&bytes, base_iri)
        .map_err(|e| LdpError::NotAcceptable.logged("parse request body", e))
}

/// `add` the graph; a refusal or store error is a conflict.
pub(super) async fn store_graph(
    state: &AppState,
    ctx: &RequestContext,
    iri: &str,
    graph: Graph,
) -> Result<Graph, LdpError> {
    match state.graphs.add(iri, graph, &ctx.access).await {
        Ok(Some(stored)) => Ok(stored),
        Ok(None) => {
            tracing::debug!(%iri, "graph store refused add");
            Err(LdpError::Conflict)
        }
        Err(e) => Err(LdpError::Conflict.logged("graph add", e)),
    }
}

/// Stream the body into the blob store. Any failure aborts the upload.
async fn upload_blob(state: &AppState, iri: &str, body: Body) -> Result<(), LdpError> {
    let mut upload = state
        .blobs
        .create_upload(iri)
        .await
        .map_err(|e| LdpError::InternalServerError.logged("open blob upload", e))?;

    let mut chunks = body.into_data_stream();
    while let Some(chunk) = chunks.next().await {
        let written = match chunk {
            Ok(data) => upload.write(data).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(cause) = written {
            if let Err(e) = upload.abort().await {
                tracing::warn!(%iri, error = %e, "abort blob upload");
            }
            return Err(LdpError::InternalServerError.logged("blob upload", cause));
        }
    }

    let size = upload
        .finish()
        .await
        .map_err(|e| LdpError::InternalServerError.logged("finish blob upload", e))?;
    tracing::debug!(%iri, size, "blob stored");
    Ok(())
}

/// `201 Created` pointing at the new resource.
pub(super) fn created(location: String) -> Response {
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

/// File extension for a declared blob media type.
fn blob_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let exts = mime_guess::get_mime_extensions_str(&essence)?;
    let subtype = essence.split_once('/').map(|(_, sub)| sub).unwrap_or_default();
    exts.iter()
        .find(|ext| **ext == subtype)
        .or_else(|| exts.first())
        .copied()
}
