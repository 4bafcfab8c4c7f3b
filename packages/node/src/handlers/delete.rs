//! `DELETE`. Success is `204 No Content` for graphs and blobs alike.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::LdpError;

use super::{
    resolve::{resolve, Resolved},
    AppState, RequestContext,
};

pub async fn delete(state: &AppState, ctx: &RequestContext) -> Result<Response, LdpError> {
    match resolve(state, &ctx.iri, &ctx.access).await {
        Resolved::Graph(_) => delete_graph(state, ctx).await,
        Resolved::Absent => delete_blob(state, ctx).await,
    }
}

async fn delete_graph(state: &AppState, ctx: &RequestContext) -> Result<Response, LdpError> {
    match state.graphs.delete(&ctx.iri, &ctx.access).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(false) => Err(LdpError::NotFound),
        Err(e) => Err(LdpError::NotFound.logged("graph delete", e)),
    }
}

async fn delete_blob(state: &AppState, ctx: &RequestContext) -> Result<Response, LdpError> {
    let exists = state
        .blobs
        .exists(&ctx.iri)
        .await
        .map_err(|e| LdpError::InternalServerError.logged("blob exists", e))?;
    if !exists {
        return Err(LdpError::NotFound);
    }
    state
        .blobs
        .remove(&ctx.iri)
        .await
        .map_err(|e| LdpError::InternalServerError.logged("blob remove", e))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
