//! The closed set of failure conditions a handler can end a request with.
//!
//! Each variant maps to one HTTP status and one fixed message. Nothing else
//! reaches the client: collaborator error detail is logged at the call site
//! and dropped. There is no `From<StorageError>`: each handler picks the
//! condition for its own context.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// A failure that ends the request; converts directly to an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LdpError {
    #[error("Forbidden")]
    Forbidden,
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Not Acceptable")]
    NotAcceptable,
    #[error("Conflict")]
    Conflict,
    #[error("Bad Request")]
    BadRequest,
    #[error("Internal Server Error")]
    InternalServerError,
}

impl LdpError {
    pub fn status(self) -> StatusCode {
        match self {
            LdpError::Forbidden => StatusCode::FORBIDDEN,
            LdpError::NotFound => StatusCode::NOT_FOUND,
            LdpError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            LdpError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            LdpError::Conflict => StatusCode::CONFLICT,
            LdpError::BadRequest => StatusCode::BAD_REQUEST,
            LdpError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The fixed message sent as the response body.
    pub fn message(self) -> &'static str {
        match self {
            LdpError::Forbidden => "Forbidden",
            LdpError::NotFound => "Not Found",
            LdpError::MethodNotAllowed => "Method Not Allowed",
            LdpError::NotAcceptable => "Not Acceptable",
            LdpError::Conflict => "Conflict",
            LdpError::BadRequest => "Bad Request",
            LdpError::InternalServerError => "Internal Server Error",
        }
    }

    /// Log `cause` and return `self`, for use in `map_err`.
    pub fn logged(self, context: &str, cause: impl std::fmt::Display) -> Self {
        tracing::warn!(status = self.status().as_u16(), "{context}: {cause}");
        self
    }
}

impl IntoResponse for LdpError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let table = [
            (LdpError::Forbidden, 403),
            (LdpError::NotFound, 404),
            (LdpError::MethodNotAllowed, 405),
            (LdpError::NotAcceptable, 406),
            (LdpError::Conflict, 409),
            (LdpError::BadRequest, 400),
            (LdpError::InternalServerError, 500),
        ];
        for (err, code) in table {
            assert_eq!(err.status().as_u16(), code);
            assert_eq!(err.to_string(), err.message());
        }
    }

    #[test]
    fn response_carries_only_the_fixed_message() {
        let resp = LdpError::Conflict.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
