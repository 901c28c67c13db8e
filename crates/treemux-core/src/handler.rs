//! Handler shapes and registration.
//!
//! A route's payload is a [`Route`], a closed sum over the two supported
//! handler shapes: a handler object implementing [`Handler`], or a plain
//! function. Both are invoked the same way with [`Route::invoke`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};

use crate::error::{MuxError, MuxResult};

/// Inbound request type seen by handlers.
pub type Request = http::Request<Bytes>;

/// Response type produced by handlers.
pub type Response = http::Response<Bytes>;

/// Result returned by handlers.
pub type HandlerResult = MuxResult<Response>;

/// A plain handler function.
pub type HandlerFn = Arc<dyn Fn(&Request) -> HandlerResult + Send + Sync>;

/// A handler object.
///
/// # Example
///
/// ```
/// use treemux_core::{Handler, HandlerResult, Request, text_response};
/// use http::StatusCode;
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn serve(&self, request: &Request) -> HandlerResult {
///         Ok(text_response(StatusCode::OK, format!("{}!", request.uri().path())))
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Serves a request.
    ///
    /// Returning an error makes the mux respond with the error's status code
    /// and a JSON error envelope.
    fn serve(&self, request: &Request) -> HandlerResult;
}

/// A registered route target.
///
/// Equality is identity: two routes are equal only if they share the same
/// underlying handler allocation.
#[derive(Clone)]
pub enum Route {
    /// A handler object.
    Handler(Arc<dyn Handler>),
    /// A plain function or closure.
    Func(HandlerFn),
}

impl Route {
    /// Wraps a handler object.
    pub fn handler(handler: impl Handler) -> Self {
        Self::Handler(Arc::new(handler))
    }

    /// Wraps a plain function or closure.
    pub fn func<F>(func: F) -> Self
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Func(Arc::new(func))
    }

    /// Invokes the handler with a request.
    pub fn invoke(&self, request: &Request) -> HandlerResult {
        match self {
            Self::Handler(handler) => handler.serve(request),
            Self::Func(func) => func(request),
        }
    }

    /// Short name of the handler shape, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Handler(_) => "handler",
            Self::Func(_) => "func",
        }
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Handler(a), Self::Handler(b)) => Arc::ptr_eq(a, b),
            (Self::Func(a), Self::Func(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Route {}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(handler) => write!(f, "Handler({:p})", Arc::as_ptr(handler).cast::<()>()),
            Self::Func(func) => write!(f, "Func({:p})", Arc::as_ptr(func).cast::<()>()),
        }
    }
}

impl<H: Handler> From<Arc<H>> for Route {
    fn from(handler: Arc<H>) -> Self {
        Self::Handler(handler)
    }
}

/// Builds a plain-text response.
#[must_use]
pub fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// The default not-found handler.
///
/// Responds with 404 and the body `404 page not found\n`.
pub fn not_found(_request: &Request) -> HandlerResult {
    let mut response = text_response(StatusCode::NOT_FOUND, "404 page not found\n");
    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    Ok(response)
}

/// Registry of named handlers.
///
/// Lets routes be declared by handler name (for example in a configuration
/// file) and resolved when they are registered, so that an unknown name is
/// rejected up front instead of turning into a 404 at dispatch time.
///
/// # Example
///
/// ```
/// use treemux_core::{HandlerRegistry, Route, not_found};
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("missing", Route::func(not_found));
///
/// assert!(registry.resolve("/x", "missing").is_ok());
/// assert!(registry.resolve("/x", "other").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Route>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route under a name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, route: Route) {
        self.handlers.insert(name.into(), route);
    }

    /// Registers a handler object under a name.
    pub fn register_handler(&mut self, name: impl Into<String>, handler: impl Handler) {
        self.register(name, Route::handler(handler));
    }

    /// Registers a plain function under a name.
    pub fn register_func<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(name, Route::func(func));
    }

    /// Returns the route registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.handlers.get(name)
    }

    /// Resolves the handler named for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::MalformedPayload`] if the name is empty or not
    /// registered.
    pub fn resolve(&self, path: &str, name: &str) -> MuxResult<Route> {
        if name.is_empty() {
            return Err(MuxError::malformed_payload(path, "handler name is empty"));
        }
        self.handlers.get(name).cloned().ok_or_else(|| {
            MuxError::malformed_payload(path, format!("no handler registered as '{name}'"))
        })
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
