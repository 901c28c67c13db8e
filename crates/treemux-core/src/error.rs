//! Error types for treemux.
//!
//! [`MuxError`] is the error type shared by handlers, registration, and
//! dispatch. Errors never cross the dispatch boundary: the mux turns them
//! into responses with [`MuxError::into_response`].

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Response;

/// Result type alias using [`MuxError`].
pub type MuxResult<T> = Result<T, MuxError>;

/// Standard error type for treemux.
///
/// # Example
///
/// ```
/// use treemux_core::MuxError;
/// use http::StatusCode;
///
/// let err = MuxError::handler(StatusCode::CONFLICT, "version mismatch");
/// assert_eq!(err.status_code(), StatusCode::CONFLICT);
/// ```
#[derive(Error, Debug)]
pub enum MuxError {
    /// No registered route matched the path, or the matched node carries no
    /// handler.
    #[error("route not found: {path}")]
    RouteNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// A registration referenced a payload that is not a usable handler.
    #[error("malformed payload for route {path}: {reason}")]
    MalformedPayload {
        /// The route path being registered.
        path: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// A handler failed while serving a request.
    #[error("handler error: {message}")]
    Handler {
        /// Status code to respond with.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl MuxError {
    /// Creates a route not found error.
    #[must_use]
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Creates a malformed payload error.
    #[must_use]
    pub fn malformed_payload(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a handler error with an explicit status code.
    #[must_use]
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error that responds with 500.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Creates a 500 handler error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MalformedPayload { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Handler { status, .. } => *status,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::Handler { .. } => "HANDLER_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let message = match self {
            // Source chains stay in the logs.
            Self::Handler { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
            },
        }
    }

    /// Renders this error as a JSON response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let body = serde_json::to_vec(&self.to_envelope()).unwrap_or_default();
        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = self.status_code();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}
