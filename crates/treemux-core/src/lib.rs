//! # Treemux Core
//!
//! Core types and the request multiplexer for treemux.
//!
//! This crate provides:
//!
//! - [`TreeMux`] - Request multiplexer backed by a segment trie
//! - [`TreeMuxBuilder`] - Registration phase producing a [`TreeMux`]
//! - [`SharedTreeMux`] - A mux that accepts registrations while serving
//! - [`Dispatch`] - The request-to-response contract servers consume
//! - [`Route`] / [`Handler`] - Handler shapes stored as route payloads
//! - [`HandlerRegistry`] - Named handlers for declarative registration
//! - [`MuxError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/treemux-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod handler;
mod mux;
mod shared;

pub use error::{ErrorDetail, ErrorEnvelope, MuxError, MuxResult};
pub use handler::{
    not_found, text_response, Handler, HandlerFn, HandlerRegistry, HandlerResult, Request,
    Response, Route,
};
pub use mux::{Dispatch, TreeMux, TreeMuxBuilder, SEPARATOR};
pub use shared::SharedTreeMux;
