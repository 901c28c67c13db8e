//! Tree-based request multiplexer.
//!
//! [`TreeMux`] owns one segment trie of [`Route`]s and dispatches requests to
//! the route matching the request path, falling back to a not-found route.
//!
//! # Example
//!
//! ```rust
//! use treemux_core::{Dispatch, TreeMux, text_response};
//! use bytes::Bytes;
//! use http::StatusCode;
//!
//! let mut mux = TreeMux::new();
//! mux.handle_func("/foo/*/bla", |_req| Ok(text_response(StatusCode::OK, "bla")));
//!
//! let request = http::Request::builder()
//!     .uri("/foo/bar/bla")
//!     .body(Bytes::new())
//!     .unwrap();
//! assert_eq!(mux.dispatch(&request).status(), StatusCode::OK);
//! ```

use metrics::counter;
use treemux_router::{Lookup, Node, DEFAULT_WILDCARD};

use crate::handler::{self, Handler, HandlerResult, Request, Response, Route};
use crate::{HandlerRegistry, MuxResult};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Something that turns requests into responses.
///
/// Implemented by [`TreeMux`] and [`SharedTreeMux`](crate::SharedTreeMux);
/// servers and test clients accept any implementation.
pub trait Dispatch: Send + Sync + 'static {
    /// Dispatches `request` using `path` for route matching.
    fn dispatch_path(&self, path: &str, request: &Request) -> Response;

    /// Dispatches `request` using its URI path.
    fn dispatch(&self, request: &Request) -> Response {
        self.dispatch_path(request.uri().path(), request)
    }
}

impl<D: Dispatch + ?Sized> Dispatch for std::sync::Arc<D> {
    fn dispatch_path(&self, path: &str, request: &Request) -> Response {
        (**self).dispatch_path(path, request)
    }
}

/// How a path resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Matched,
    NotFound,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::NotFound => "not_found",
        }
    }
}

/// A request multiplexer backed by a segment trie.
///
/// Routes are slash-delimited paths. The leading `/` is optional, so
/// `"/foo/bar"` and `"foo/bar"` name the same route. A segment equal to the
/// wildcard token (`*` unless configured otherwise) matches any single path
/// component at dispatch time.
///
/// # Route Priority
///
/// Children are tried in the order they were registered. When a literal and
/// a wildcard could both match, whichever was registered first wins:
///
/// ```rust
/// use treemux_core::{TreeMux, Route, not_found};
///
/// let wildcard = Route::func(not_found);
/// let literal = Route::func(not_found);
///
/// let mut mux = TreeMux::new();
/// mux.route("foo/*", wildcard.clone());
/// mux.route("foo/bar", literal.clone());
///
/// assert_eq!(mux.resolve("foo/bar"), Some(&wildcard));
/// ```
#[derive(Debug, Clone)]
pub struct TreeMux {
    trie: Node<Route>,
    not_found: Route,
    wildcard: String,
}

impl Default for TreeMux {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeMux {
    /// Creates a mux that answers unmatched paths with the default 404.
    #[must_use]
    pub fn new() -> Self {
        Self::with_not_found(None)
    }

    /// Creates a mux with a custom not-found route.
    ///
    /// `None` falls back to the default [`not_found`](handler::not_found).
    #[must_use]
    pub fn with_not_found(not_found: Option<Route>) -> Self {
        Self {
            trie: Node::root(),
            not_found: not_found.unwrap_or_else(|| Route::func(handler::not_found)),
            wildcard: DEFAULT_WILDCARD.to_string(),
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> TreeMuxBuilder {
        TreeMuxBuilder::new()
    }

    /// Registers a handler object at `path`, replacing any previous route.
    pub fn handle(&mut self, path: &str, handler: impl Handler) {
        self.route(path, Route::handler(handler));
    }

    /// Registers a plain function at `path`, replacing any previous route.
    pub fn handle_func<F>(&mut self, path: &str, func: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(path, Route::func(func));
    }

    /// Registers a route at `path`, replacing any previous route.
    pub fn route(&mut self, path: &str, route: Route) {
        let kind = route.kind();
        if self.trie.insert(path, SEPARATOR, route).is_some() {
            tracing::debug!(path, kind, "route replaced");
        } else {
            tracing::debug!(path, kind, "route registered");
        }
    }

    /// Registers the handler named `name` in `registry` at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::MalformedPayload`](crate::MuxError::MalformedPayload)
    /// if the registry has no such handler; nothing is registered then.
    pub fn named_route(&mut self, path: &str, name: &str, registry: &HandlerRegistry) -> MuxResult<()> {
        let route = registry.resolve(path, name)?;
        self.route(path, route);
        Ok(())
    }

    /// Returns the route a path resolves to, or `None` if the not-found
    /// route would be used.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        match self.trie.lookup_with_wildcard(path, SEPARATOR, &self.wildcard) {
            Lookup::Payload(route) => Some(route),
            Lookup::Waypoint | Lookup::NotFound => None,
        }
    }

    pub(crate) fn select(&self, path: &str) -> (&Route, Outcome) {
        match self.resolve(path) {
            Some(route) => (route, Outcome::Matched),
            None => (&self.not_found, Outcome::NotFound),
        }
    }

    /// The not-found route.
    #[must_use]
    pub fn not_found(&self) -> &Route {
        &self.not_found
    }

    /// The wildcard token used for dispatch.
    #[must_use]
    pub fn wildcard(&self) -> &str {
        &self.wildcard
    }

    /// The underlying trie.
    #[must_use]
    pub fn trie(&self) -> &Node<Route> {
        &self.trie
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trie.route_count()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Dispatch for TreeMux {
    fn dispatch_path(&self, path: &str, request: &Request) -> Response {
        let (route, outcome) = self.select(path);
        invoke(route, outcome, path, request)
    }
}

/// Invokes a selected route, converting handler errors into responses.
pub(crate) fn invoke(route: &Route, outcome: Outcome, path: &str, request: &Request) -> Response {
    let response = match route.invoke(request) {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(path, error = %err, "handler failed");
            counter!("treemux_handler_errors_total").increment(1);
            err.into_response()
        }
    };

    let status = response.status().as_u16();
    tracing::debug!(path, outcome = outcome.as_str(), status, "request dispatched");
    counter!(
        "treemux_dispatch_total",
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);

    response
}

/// Builder for [`TreeMux`].
///
/// Collects registrations and produces a mux, which can then be shared
/// immutably (e.g. behind an `Arc`) while serving.
///
/// # Example
///
/// ```rust
/// use treemux_core::{TreeMux, text_response};
/// use http::StatusCode;
///
/// let mux = TreeMux::builder()
///     .not_found(treemux_core::Route::func(|_req| {
///         Ok(text_response(StatusCode::GONE, "gone"))
///     }))
///     .handle_func("/health", |_req| Ok(text_response(StatusCode::OK, "ok")))
///     .build();
///
/// assert_eq!(mux.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TreeMuxBuilder {
    not_found: Option<Route>,
    wildcard: Option<String>,
    routes: Vec<(String, Route)>,
}

impl TreeMuxBuilder {
    /// Creates a builder with the default not-found route and wildcard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the not-found route.
    #[must_use]
    pub fn not_found(mut self, route: Route) -> Self {
        self.not_found = Some(route);
        self
    }

    /// Sets the wildcard token used for dispatch.
    #[must_use]
    pub fn wildcard(mut self, token: impl Into<String>) -> Self {
        self.wildcard = Some(token.into());
        self
    }

    /// Registers a route.
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, route: Route) -> Self {
        self.routes.push((path.into(), route));
        self
    }

    /// Registers a handler object.
    #[must_use]
    pub fn handle(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.route(path, Route::handler(handler))
    }

    /// Registers a plain function.
    #[must_use]
    pub fn handle_func<F>(self, path: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(path, Route::func(func))
    }

    /// Registers the handler named `name` in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::MalformedPayload`](crate::MuxError::MalformedPayload)
    /// if the registry has no such handler.
    pub fn named_route(
        self,
        path: impl Into<String>,
        name: &str,
        registry: &HandlerRegistry,
    ) -> MuxResult<Self> {
        let path = path.into();
        let route = registry.resolve(&path, name)?;
        Ok(self.route(path, route))
    }

    /// Builds the mux, registering routes in the order they were added.
    #[must_use]
    pub fn build(self) -> TreeMux {
        let mut mux = TreeMux::with_not_found(self.not_found);
        if let Some(wildcard) = self.wildcard {
            mux.wildcard = wildcard;
        }
        for (path, route) in self.routes {
            mux.route(&path, route);
        }
        mux
    }
}
