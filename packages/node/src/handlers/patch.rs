//! `PATCH`: merge an RDF body into an existing or new graph.
//!
//! Blobs are never patchable.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::LdpError;

use super::{
    resolve::{resolve, Resolved},
    write::parse_body,
    AppState, RequestContext,
};

pub async fn patch(state: &AppState, ctx: &RequestContext, body: Body) -> Result<Response, LdpError> {
    let mime = state
        .codecs
        .accepts_parser(ctx.header(header::CONTENT_TYPE))
        .ok_or(LdpError::NotAcceptable)?;

    if let Resolved::Absent = resolve(state, &ctx.iri, &ctx.access).await {
        match state.blobs.exists(&ctx.iri).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!(iri = %ctx.iri, "refusing to patch a blob");
                return Err(LdpError::NotAcceptable);
            }
            Err(e) => return Err(LdpError::InternalServerError.logged("blob exists", e)),
        }
    }

    let graph = parse_body(state, &mime, body, &ctx.iri).await?;
    match state.graphs.merge(&ctx.iri, graph, &ctx.access).await {
        Ok(Some(merged)) => {
            tracing::debug!(iri = %ctx.iri, triples = merged.len(), "graph merged");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Ok(None) => {
            tracing::debug!(iri = %ctx.iri, "graph store refused merge");
            Err(LdpError::Forbidden)
        }
        Err(e) => Err(LdpError::Forbidden.logged("graph merge", e)),
    }
}
