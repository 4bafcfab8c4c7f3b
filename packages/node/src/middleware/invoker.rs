//! Identify who is invoking a request.
//!
//! The transport layer (an authentication layer, a test harness) may attach a
//! [`Session`] to the request extensions. [`Invoker`] reads it, falls back to
//! the configured default agent, and records the `Origin` header as the
//! calling application.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{handlers::AppState, storage::AccessContext};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Authenticated session data attached by whatever sits in front of the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub agent: Option<String>,
}

impl Session {
    pub fn agent(agent: impl Into<String>) -> Self {
        Self {
            agent: Some(agent.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Invoker extractor
// ---------------------------------------------------------------------------

/// Axum extractor yielding the agent and application behind a request.
///
/// Never rejects. With no session agent and no configured default, the
/// agent is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub agent: Option<String>,
    pub application: Option<String>,
}

impl Invoker {
    fn from_parts(parts: &Parts, default_agent: Option<&str>) -> Self {
        let agent = parts
            .extensions
            .get::<Session>()
            .and_then(|s| s.agent.clone())
            .or_else(|| default_agent.map(str::to_string));
        let application = parts
            .headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self { agent, application }
    }

    /// The context handed to the graph store.
    pub fn access(&self) -> AccessContext {
        AccessContext {
            agent: self.agent.clone(),
            application: self.application.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for Invoker
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        let invoker = Invoker::from_parts(parts, app_state.config.default_agent.as_deref());
        async move { Ok(invoker) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(session: Option<Session>, origin: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/doc");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(session) = session {
            req.extensions_mut().insert(session);
        }
        req.into_parts().0
    }

    #[test]
    fn session_agent_wins_over_default() {
        let p = parts(Some(Session::agent("https://alice.example/#me")), None);
        let inv = Invoker::from_parts(&p, Some("https://default.example/#me"));
        assert_eq!(inv.agent.as_deref(), Some("https://alice.example/#me"));
    }

    #[test]
    fn falls_back_to_default_agent() {
        let p = parts(Some(Session::default()), None);
        let inv = Invoker::from_parts(&p, Some("https://default.example/#me"));
        assert_eq!(inv.agent.as_deref(), Some("https://default.example/#me"));

        let p = parts(None, None);
        assert_eq!(Invoker::from_parts(&p, None).agent, None);
    }

    #[test]
    fn origin_becomes_application() {
        let p = parts(None, Some("https://app.example"));
        let access = Invoker::from_parts(&p, None).access();
        assert_eq!(access.application.as_deref(), Some("https://app.example"));
        assert_eq!(access.agent, None);
    }
}
