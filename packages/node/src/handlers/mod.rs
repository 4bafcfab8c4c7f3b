//! HTTP binding of the LDP verbs onto graph and blob resources.
//!
//! There are no routes: every request lands in [`dispatch`], which turns the
//! request into a [`RequestContext`] and hands it to exactly one verb
//! handler. Handlers return `Result<Response, LdpError>`, so each request
//! ends with exactly one response.
//!
//! | Verb | Handler |
//! |------|---------|
//! | `GET`, `HEAD` | [`read::get`] |
//! | `PUT` | [`write::put`] |
//! | `POST` (with a basic-container `Link`) | [`container::create`] |
//! | `POST` (otherwise) | [`write::post`] |
//! | `PATCH` | [`patch::patch`] |
//! | `DELETE` | [`delete::delete`] |

pub mod container;
pub mod delete;
pub mod patch;
pub mod read;
pub mod resolve;
pub mod write;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
};
use ldp::{CodecRegistry, ContainerLinkSet};

use crate::{
    config::NodeConfig,
    error::LdpError,
    middleware::invoker::Invoker,
    storage::{AccessContext, BlobStore, GraphStore},
};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub graphs: Arc<dyn GraphStore>,
    pub blobs: Arc<dyn BlobStore>,
    /// Immutable; built once at startup.
    pub codecs: Arc<CodecRegistry>,
    pub config: NodeConfig,
}

impl AppState {
    /// State with the built-in Turtle and N-Triples codecs.
    pub fn new(graphs: Arc<dyn GraphStore>, blobs: Arc<dyn BlobStore>, config: NodeConfig) -> Self {
        let state = Self {
            graphs,
            blobs,
            codecs: Arc::new(CodecRegistry::with_defaults()),
            config,
        };
        if !state.default_type_is_served() {
            tracing::warn!(
                default_type = state.config.default_type.as_deref().unwrap_or_default(),
                "no serializer for the default type; unmatched Accept headers will get 406"
            );
        }
        state
    }

    /// `false` when a default type is configured that no serializer handles.
    pub fn default_type_is_served(&self) -> bool {
        self.config
            .default_type
            .as_deref()
            .map_or(true, |mime| self.codecs.serializer(mime).is_some())
    }
}

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// The verbs this node serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdpMethod {
    Get,
    Head,
    Put,
    Post,
    Patch,
    Delete,
}

impl LdpMethod {
    /// `None` for every verb the node does not serve.
    pub fn from_http(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "PUT" => Some(Self::Put),
            "POST" => Some(Self::Post),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Per-request state shared by the verb handlers. Never outlives the request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: LdpMethod,
    /// Absolute IRI of the target resource.
    pub iri: String,
    pub headers: HeaderMap,
    pub access: AccessContext,
}

impl RequestContext {
    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn links(&self) -> ContainerLinkSet {
        ContainerLinkSet::from_values(
            self.headers
                .get_all(header::LINK)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
    }

    /// `HEAD` requests run the `GET` logic but never get a body.
    pub fn skip_body(&self) -> bool {
        self.method == LdpMethod::Head
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Fallback handler for every request.
pub async fn dispatch(
    State(state): State<AppState>,
    invoker: Invoker,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let iri = state.config.request_iri(parts.uri.path());

    tracing::info!(
        timestamp = %chrono::Utc::now().to_rfc3339(),
        method = %parts.method,
        iri = %iri,
        agent = invoker.agent.as_deref().unwrap_or("null"),
        application = invoker.application.as_deref().unwrap_or("null"),
        "request"
    );

    let Some(method) = LdpMethod::from_http(&parts.method) else {
        return LdpError::MethodNotAllowed.into_response();
    };
    let ctx = RequestContext {
        method,
        iri,
        headers: parts.headers,
        access: invoker.access(),
    };

    route(&state, &ctx, body)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn route(state: &AppState, ctx: &RequestContext, body: Body) -> Result<Response, LdpError> {
    match ctx.method {
        LdpMethod::Get | LdpMethod::Head => read::get(state, ctx).await,
        LdpMethod::Put => write::put(state, ctx, body).await,
        LdpMethod::Post if ctx.links().is_basic_container() => {
            container::create(state, ctx, body).await
        }
        LdpMethod::Post => write::post(state, ctx, body).await,
        LdpMethod::Patch => patch::patch(state, ctx, body).await,
        LdpMethod::Delete => delete::delete(state, ctx).await,
    }
}
