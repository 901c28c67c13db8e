//! # treemux Server
//!
//! HTTP/1.1 server for any [`Dispatch`](treemux_core::Dispatch)
//! implementation, built on Hyper and Tokio:
//!
//! - One task per connection
//! - Request bodies collected under a size limit and a timeout
//! - Dispatch under a timeout
//! - Graceful shutdown with connection draining
//!
//! ## Example
//!
//! ```rust,ignore
//! use treemux_config::ConfigLoader;
//! use treemux_core::{text_response, HandlerRegistry};
//! use treemux_server::Server;
//! use http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_file("treemux.toml")?
//!         .with_env_prefix("TREEMUX")
//!         .load()?;
//!
//!     let mut registry = HandlerRegistry::new();
//!     registry.register_func("hello", |_req| Ok(text_response(StatusCode::OK, "hello")));
//!
//!     Server::from_config(&config, &registry)?.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use server::{HttpResponse, Server, ServerBuilder};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
