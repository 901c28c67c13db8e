//! Ordered segment trie for treemux.
//!
//! This crate provides the tree used to match slash-delimited request paths
//! against registered routes. Paths are split into segments and stored one
//! node per segment; a lookup walks the tree segment by segment.
//!
//! # Features
//!
//! - **Exact Segments**: case-sensitive, exact string equality
//! - **Lookup-Time Wildcards**: any node whose segment equals the wildcard
//!   token (`*` by default) matches one input segment
//! - **Insertion Order Wins**: children are tried in the order they were added
//! - **Leading Separator Optional**: `"/foo"` and `"foo"` are the same path
//!
//! # Example
//!
//! ```rust
//! use treemux_router::{Lookup, Node};
//!
//! let mut trie = Node::root();
//! trie.insert("/foo/*/bla", '/', "fn");
//!
//! assert_eq!(trie.lookup("/foo/bar/bla", '/'), Lookup::Payload(&"fn"));
//! assert_eq!(trie.lookup("foo/moo/bla", '/'), Lookup::Payload(&"fn"));
//! assert_eq!(trie.lookup("/foo/moo", '/'), Lookup::Waypoint);
//! assert_eq!(trie.lookup("/bar", '/'), Lookup::NotFound);
//! ```
//!
//! # Architecture
//!
//! ```text
//!                (root "")
//!                    │
//!                  "foo"
//!                    │
//!          ┌─────────┼─────────┐
//!          │         │         │
//!        "bar"      "*"     "slash"
//!                              │
//!                             ""
//! ```
//!
//! With this tree, `/foo/slash` resolves to `*` because it was inserted
//! before `slash`.

mod node;

pub use node::{Node, DEFAULT_WILDCARD};

/// Outcome of a trie lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// The path matched a node carrying a payload.
    Payload(&'a T),
    /// The path matched a node that carries no payload.
    Waypoint,
    /// No node matched the path.
    NotFound,
}

impl<'a, T> Lookup<'a, T> {
    /// Returns true if the path matched a node, with or without payload.
    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Returns the matched payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&'a T> {
        match self {
            Self::Payload(payload) => Some(payload),
            Self::Waypoint | Self::NotFound => None,
        }
    }
}
