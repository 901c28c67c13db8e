//! # Treemux Test
//!
//! In-memory testing for treemux dispatchers. Requests are built with
//! [`TestClient`], handed directly to a [`Dispatch`](treemux_core::Dispatch)
//! implementation, and captured as a [`TestResponse`] with assertion
//! helpers. No sockets or runtime are involved.
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use serde_json::json;
//! use treemux_core::{text_response, MuxError, TreeMux};
//! use treemux_test::TestClient;
//!
//! let mux = TreeMux::builder()
//!     .handle_func("/moo/", |_req| Ok(text_response(StatusCode::OK, "moo")))
//!     .handle_func("/taken", |_req| Err(MuxError::handler(StatusCode::CONFLICT, "taken")))
//!     .build();
//! let client = TestClient::new(mux);
//!
//! client.get("/moo/anything").send().assert_body_eq("moo");
//! client
//!     .post("/taken")
//!     .send()
//!     .assert_status(StatusCode::CONFLICT)
//!     .assert_json_field("error.code", &json!("HANDLER_ERROR"));
//! ```

#![doc(html_root_url = "https://docs.rs/treemux-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::{TestResponse, NOT_FOUND_BODY};
