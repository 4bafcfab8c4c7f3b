//! `POST` with `Link: <http://www.w3.org/ns/ldp#BasicContainer>; rel="type"`.

use axum::{body::Body, http::header, response::Response};
use ldp::{Graph, Slug, Term, Triple, BASIC_CONTAINER, RDF_TYPE};

use crate::error::LdpError;

use super::{
    write::{created, new_child, parse_body, store_graph},
    AppState, RequestContext,
};

/// Create a basic container inside the request IRI.
///
/// An RDF body becomes the container's initial graph; any other body is
/// ignored. The stored graph always types the new IRI as a basic container.
pub async fn create(state: &AppState, ctx: &RequestContext, body: Body) -> Result<Response, LdpError> {
    let slug = Slug::from_header(ctx.header("slug"));
    let child = new_child(state, ctx, &slug.container_segment()).await?;

    let mut graph = match state.codecs.accepts_parser(ctx.header(header::CONTENT_TYPE)) {
        Some(mime) => parse_body(state, &mime, body, &child).await?,
        None => Graph::new(),
    };
    graph.insert(Triple::new(
        Term::iri(child.as_str()),
        RDF_TYPE,
        Term::iri(BASIC_CONTAINER),
    ));

    store_graph(state, ctx, &child, graph).await?;
    tracing::debug!(%child, "container created");
    Ok(created(child))
}
