//! A mux that accepts registrations while serving.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::handler::{Handler, HandlerResult, Request, Response, Route};
use crate::mux::{invoke, Dispatch, TreeMux};

/// A [`TreeMux`] behind a reader/writer lock.
///
/// Dispatch holds the read lock only while resolving the route; the handler
/// runs after the lock is released, so handlers may register further routes.
/// Registration takes the write lock. Clones share the same mux.
///
/// Prefer building a [`TreeMux`] up front and sharing it through an `Arc`
/// when all routes are known before serving starts.
#[derive(Debug, Clone, Default)]
pub struct SharedTreeMux {
    inner: Arc<RwLock<TreeMux>>,
}

impl SharedTreeMux {
    /// Wraps an existing mux.
    #[must_use]
    pub fn new(mux: TreeMux) -> Self {
        Self {
            inner: Arc::new(RwLock::new(mux)),
        }
    }

    /// Registers a handler object at `path`.
    pub fn handle(&self, path: &str, handler: impl Handler) {
        self.inner.write().handle(path, handler);
    }

    /// Registers a plain function at `path`.
    pub fn handle_func<F>(&self, path: &str, func: F)
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner.write().handle_func(path, func);
    }

    /// Registers a route at `path`.
    pub fn route(&self, path: &str, route: Route) {
        self.inner.write().route(path, route);
    }

    /// Returns the route a path currently resolves to.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Route> {
        self.inner.read().resolve(path).cloned()
    }

    /// Returns a copy of the current mux.
    #[must_use]
    pub fn snapshot(&self) -> TreeMux {
        self.inner.read().clone()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<TreeMux> for SharedTreeMux {
    fn from(mux: TreeMux) -> Self {
        Self::new(mux)
    }
}

impl Dispatch for SharedTreeMux {
    fn dispatch_path(&self, path: &str, request: &Request) -> Response {
        let (route, outcome) = {
            let mux = self.inner.read();
            let (route, outcome) = mux.select(path);
            (route.clone(), outcome)
        };
        invoke(&route, outcome, path, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_response;
    use bytes::Bytes;
    use http::StatusCode;

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Bytes::new())
            .expect("valid request")
    }

    #[test]
    fn test_late_registration() {
        let mux = SharedTreeMux::default();
        assert!(mux.is_empty());
        assert_eq!(mux.dispatch(&request("/late")).status(), StatusCode::NOT_FOUND);

        mux.handle_func("/late", |_req| Ok(text_response(StatusCode::OK, "late")));
        assert_eq!(mux.dispatch(&request("/late")).status(), StatusCode::OK);
        assert_eq!(mux.len(), 1);
    }

    #[test]
    fn test_handler_may_register_routes() {
        let mux = SharedTreeMux::default();
        let registrar = mux.clone();
        mux.handle_func("/install", move |_req| {
            registrar.handle_func("/installed", |_req| {
                Ok(text_response(StatusCode::OK, "installed"))
            });
            Ok(text_response(StatusCode::CREATED, "ok"))
        });

        assert_eq!(mux.dispatch(&request("/install")).status(), StatusCode::CREATED);
        assert_eq!(mux.dispatch(&request("/installed")).body(), "installed");
    }

    #[test]
    fn test_concurrent_dispatch_and_registration() {
        let mux = SharedTreeMux::new(TreeMux::new());

        std::thread::scope(|scope| {
            for i in 0..4 {
                let mux = &mux;
                scope.spawn(move || {
                    for j in 0..50 {
                        mux.handle_func(&format!("/t{i}/{j}"), |_req| {
                            Ok(text_response(StatusCode::OK, "ok"))
                        });
                        let _ = mux.dispatch(&request(&format!("/t{i}/{j}")));
                    }
                });
            }
        });

        assert_eq!(mux.len(), 200);
        assert_eq!(mux.dispatch(&request("/t3/49")).status(), StatusCode::OK);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mux = SharedTreeMux::from(TreeMux::new());
        let before = mux.snapshot();
        mux.route("/a", Route::func(crate::not_found));

        assert!(before.is_empty());
        assert!(mux.resolve("/a").is_some());
    }
}
