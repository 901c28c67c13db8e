//! # Treemux
//!
//! A request multiplexer backed by a segment trie. Paths are split on `/`
//! and matched one segment at a time; a reserved wildcard segment (`*` by
//! default) matches any single component. When several registrations could
//! match, the one inserted first wins.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treemux::prelude::*;
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mux = TreeMux::builder()
//!         .handle_func("/foo/*/bla", |_req| Ok(text_response(StatusCode::OK, "bla")))
//!         .handle_func("/moo/", |req| {
//!             Ok(text_response(StatusCode::OK, format!("{}!", req.uri().path())))
//!         })
//!         .build();
//!
//!     Server::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .build(mux)
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`router`]: the payload-agnostic segment trie
//! - [`core`]: handlers, routes, and the `TreeMux` dispatcher
//! - [`config`]: layered TOML/JSON/env configuration
//! - [`telemetry`]: logging and Prometheus metrics
//! - [`server`]: the HTTP/1.1 server

#![doc(html_root_url = "https://docs.rs/treemux/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use treemux_config as config;
pub use treemux_core as core;
pub use treemux_router as router;
pub use treemux_server as server;
pub use treemux_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use treemux::prelude::*;
/// ```
pub mod prelude {
    pub use treemux_config::{ConfigLoader, TreeMuxConfig};
    pub use treemux_core::{
        not_found, text_response, Dispatch, Handler, HandlerRegistry, HandlerResult, MuxError,
        MuxResult, Request, Response, Route, SharedTreeMux, TreeMux, TreeMuxBuilder,
    };
    pub use treemux_router::{Lookup, Node};
    pub use treemux_server::{Server, ServerError, ShutdownSignal};
    pub use treemux_telemetry::{init_telemetry, TelemetryConfig};
}
