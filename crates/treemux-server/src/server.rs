//! HTTP server.
//!
//! The server accepts TCP connections, serves each on its own task with
//! hyper's HTTP/1 connection driver, collects the request body into
//! [`Bytes`] under a size limit, and hands the request to a [`Dispatch`]
//! implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use treemux_core::{text_response, TreeMux};
//! use treemux_server::Server;
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), treemux_server::ServerError> {
//!     let mux = TreeMux::builder()
//!         .handle_func("/foo/*", |_req| Ok(text_response(StatusCode::OK, "foo")))
//!         .build();
//!
//!     Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .build(mux)
//!         .run()
//!         .await
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use treemux_config::TreeMuxConfig;
use treemux_core::{Dispatch, HandlerRegistry, MuxError, Response, TreeMux};
use treemux_telemetry::metrics::record_request;
use treemux_telemetry::InFlightGuard;

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response type written to the wire.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// An HTTP server in front of a dispatcher.
pub struct Server<D = TreeMux> {
    config: ServerConfig,
    dispatcher: Arc<D>,
}

impl<D: fmt::Debug> fmt::Debug for Server<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl<D: Dispatch> Server<D> {
    /// Creates a server for `dispatcher`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use treemux_core::TreeMux;
    /// use treemux_server::{Server, ServerConfig};
    ///
    /// let server = Server::new(ServerConfig::default(), TreeMux::new());
    /// assert_eq!(server.config().http_addr(), "0.0.0.0:8080");
    /// ```
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: D) -> Self {
        Self::from_shared(config, Arc::new(dispatcher))
    }

    /// Creates a server for a dispatcher that is already shared.
    #[must_use]
    pub fn from_shared(config: ServerConfig, dispatcher: Arc<D>) -> Self {
        Self { config, dispatcher }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<D> {
        &self.dispatcher
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(err) = server.handle_connection(stream, peer_addr, shutdown).await {
                                    tracing::debug!(%peer_addr, error = %err, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            timeout = ?shutdown_timeout,
            connections = tracker.active_connections(),
            "waiting for connections to close"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    connections = tracker.active_connections(),
                    "shutdown timeout reached"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        peer_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);

        let service = service_fn(move |req: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(%peer_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_request(&self, req: http::Request<Incoming>) -> HttpResponse {
        let _in_flight = InFlightGuard::new();
        let start = Instant::now();

        let (parts, body) = req.into_parts();
        let timeout = self.config.request_timeout();
        let limit = self.config.max_body_bytes();

        let body = match tokio::time::timeout(timeout, collect_body(body, limit)).await {
            Ok(Ok(body)) => body,
            Ok(Err(response)) => return finish(*response, start),
            Err(_) => {
                tracing::warn!(http.path = parts.uri.path(), "request body timed out");
                return finish(
                    MuxError::handler(StatusCode::REQUEST_TIMEOUT, "request body timed out")
                        .into_response(),
                    start,
                );
            }
        };

        let request = http::Request::from_parts(parts, body);
        let response = dispatch_with_timeout(Arc::clone(&self.dispatcher), request, timeout).await;
        finish(response, start)
    }
}

impl Server<TreeMux> {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Builds a server from file configuration.
    ///
    /// Routes under `[[router.routes]]` are registered in order, each
    /// resolved by handler name in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the configuration is invalid, or
    /// [`ServerError::Routes`] if a route names an unregistered handler.
    pub fn from_config(config: &TreeMuxConfig, registry: &HandlerRegistry) -> Result<Self, ServerError> {
        config.validate()?;

        let mut builder = TreeMux::builder().wildcard(config.router.wildcard.clone());
        for route in &config.router.routes {
            builder = builder.named_route(route.path.clone(), &route.handler, registry)?;
        }
        let mux = builder.build();
        tracing::info!(routes = mux.len(), "routes loaded from configuration");

        Ok(Self::new(ServerConfig::from(&config.server), mux))
    }
}

/// Builder for [`Server`].
#[derive(Debug, Clone, Default)]
pub struct ServerBuilder {
    config: ServerConfigBuilder,
}

impl ServerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config = self.config.http_addr(addr);
        self
    }

    /// Sets the shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.shutdown_timeout(timeout);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.request_timeout(timeout);
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config = self.config.max_body_bytes(limit);
        self
    }

    /// Builds a server for `dispatcher`.
    #[must_use]
    pub fn build<D: Dispatch>(self, dispatcher: D) -> Server<D> {
        Server::new(self.config.build(), dispatcher)
    }
}

async fn collect_body(body: Incoming, limit: usize) -> Result<Bytes, Box<Response>> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit, "request body too large");
            Err(Box::new(
                MuxError::handler(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
                    .into_response(),
            ))
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to read request body");
            Err(Box::new(
                MuxError::handler(StatusCode::BAD_REQUEST, "failed to read request body")
                    .into_response(),
            ))
        }
    }
}

/// Runs the dispatcher on the blocking pool so a slow handler can be timed
/// out without stalling the connection task.
///
/// The timeout abandons the handler but does not cancel it: the blocking
/// thread stays busy until the handler returns, so handlers that routinely
/// overrun can exhaust the blocking pool.
async fn dispatch_with_timeout<D: Dispatch>(
    dispatcher: Arc<D>,
    request: treemux_core::Request,
    timeout: Duration,
) -> Response {
    let path = request.uri().path().to_string();
    let task = tokio::task::spawn_blocking(move || dispatcher.dispatch(&request));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            tracing::error!(http.path = %path, error = %err, "handler panicked");
            MuxError::internal("handler panicked").into_response()
        }
        Err(_) => {
            tracing::warn!(http.path = %path, "handler timed out");
            MuxError::handler(StatusCode::GATEWAY_TIMEOUT, "handler timed out").into_response()
        }
    }
}

fn finish(response: Response, start: Instant) -> HttpResponse {
    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    record_request(status, elapsed);
    tracing::debug!(
        http.status_code = status,
        duration_ms = elapsed.as_secs_f64() * 1000.0,
        "request served"
    );
    response.map(Full::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treemux_config::{RouteConfig, RouterConfig};
    use treemux_core::{text_response, Route};

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register_func("foo", |_req| Ok(text_response(StatusCode::OK, "foo!")));
        registry.register_func("moo", |_req| Ok(text_response(StatusCode::OK, "moo!")));
        registry
    }

    fn request(path: &str) -> treemux_core::Request {
        http::Request::builder()
            .uri(path)
            .body(Bytes::new())
            .expect("valid request")
    }

    #[test]
    fn test_builder() {
        let server = Server::builder()
            .http_addr("127.0.0.1:3000")
            .request_timeout(Duration::from_secs(2))
            .max_body_bytes(8)
            .build(TreeMux::new());

        assert_eq!(server.config().http_addr(), "127.0.0.1:3000");
        assert_eq!(server.config().request_timeout(), Duration::from_secs(2));
        assert_eq!(server.config().max_body_bytes(), 8);
        assert!(server.dispatcher().is_empty());
    }

    #[test]
    fn test_from_config_registers_routes_in_order() {
        let config = TreeMuxConfig::builder()
            .router(RouterConfig {
                wildcard: ":any".to_string(),
                routes: vec![
                    RouteConfig::new("/foo/:any", "foo"),
                    RouteConfig::new("foo/bar", "moo"),
                ],
            })
            .build();

        let server = Server::from_config(&config, &registry()).unwrap();
        let mux = server.dispatcher();
        assert_eq!(mux.len(), 2);
        assert_eq!(mux.wildcard(), ":any");

        // The wildcard route was registered first, so it wins.
        let response = mux.dispatch(&request("/foo/bar"));
        assert_eq!(response.body(), "foo!");
    }

    #[test]
    fn test_from_config_unknown_handler() {
        let config = TreeMuxConfig::builder()
            .router(RouterConfig {
                routes: vec![RouteConfig::new("/users", "listUsers")],
                ..Default::default()
            })
            .build();

        let err = Server::from_config(&config, &registry()).err().unwrap();
        assert!(matches!(err, ServerError::Routes(MuxError::MalformedPayload { .. })));
    }

    #[test]
    fn test_from_config_invalid_config() {
        let mut config = TreeMuxConfig::default();
        config.server.http_addr = "nowhere".to_string();

        let err = Server::from_config(&config, &registry()).err().unwrap();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_debug_shows_config() {
        let server = Server::builder().http_addr("127.0.0.1:0").build(TreeMux::new());
        let debug = format!("{server:?}");
        assert!(debug.starts_with("Server"));
        assert!(debug.contains("127.0.0.1:0"));
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let server = Server::builder().http_addr("invalid").build(TreeMux::new());
        let result = server.run_with_shutdown(ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let server = Server::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build(TreeMux::new());

        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        let handle = tokio::spawn(server.run_with_shutdown(shutdown));

        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.trigger();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server should stop")
            .expect("task should not panic");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_timeout() {
        let mux = TreeMux::builder()
            .route(
                "/slow",
                Route::func(|_req| {
                    std::thread::sleep(Duration::from_millis(200));
                    Ok(text_response(StatusCode::OK, "late"))
                }),
            )
            .build();

        let response =
            dispatch_with_timeout(Arc::new(mux), request("/slow"), Duration::from_millis(20)).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_dispatch_panic_becomes_500() {
        let mux = TreeMux::builder()
            .handle_func("/boom", |_req| panic!("boom"))
            .build();

        let response =
            dispatch_with_timeout(Arc::new(mux), request("/boom"), Duration::from_secs(1)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
