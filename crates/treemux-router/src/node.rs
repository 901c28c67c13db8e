//! Segment trie node implementation.
//!
//! This module provides the ordered, recursive tree used for path matching.
//! Every node owns its children; child order is insertion order and decides
//! which subtree wins when more than one could match.

use std::fmt;

use smallvec::SmallVec;

use crate::Lookup;

/// Wildcard token used by [`Node::lookup`].
pub const DEFAULT_WILDCARD: &str = "*";

/// Number of segments split onto the stack before spilling to the heap.
const INLINE_SEGMENTS: usize = 8;

type Segments<'a> = SmallVec<[&'a str; INLINE_SEGMENTS]>;

fn split(path: &str, separator: char) -> Segments<'_> {
    path.split(separator).collect()
}

/// A node in the segment trie.
///
/// The root of a trie is a node whose segment is the empty string. Each node
/// may carry a payload; a node without one is a waypoint that a later
/// insertion can populate.
///
/// Wildcards have no special status here. A segment such as `*` is stored
/// like any other literal and only becomes a wildcard when passed to
/// [`Node::lookup_with_wildcard`], so a single trie can serve different
/// wildcard schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    segment: String,
    payload: Option<T>,
    children: Vec<Node<T>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self::root()
    }
}

impl<T> Node<T> {
    /// Creates a node for the given segment, without payload or children.
    #[must_use]
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            payload: None,
            children: Vec::new(),
        }
    }

    /// Creates an empty root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    /// Sets the payload, consuming and returning the node.
    #[must_use]
    pub fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Appends a child, consuming and returning the node.
    ///
    /// This does not check for duplicate segments; it exists for building
    /// expected trees by hand.
    #[must_use]
    pub fn with_child(mut self, child: Node<T>) -> Self {
        self.children.push(child);
        self
    }

    /// The segment this node represents.
    #[must_use]
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The payload stored at this node, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Node<T>] {
        &self.children
    }

    /// Returns true if the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Counts the nodes in this subtree that carry a payload.
    #[must_use]
    pub fn route_count(&self) -> usize {
        usize::from(self.payload.is_some())
            + self.children.iter().map(Node::route_count).sum::<usize>()
    }

    /// Splits `path` on `separator` and stores `payload` at the end of it.
    ///
    /// A leading separator is ignored, so these two calls address the same
    /// node:
    ///
    /// ```rust
    /// use treemux_router::Node;
    ///
    /// let mut trie = Node::root();
    /// assert_eq!(trie.insert("/foo/bar", '/', 1), None);
    /// assert_eq!(trie.insert("foo/bar", '/', 2), Some(1));
    /// assert_eq!(trie.children().len(), 1);
    /// ```
    ///
    /// Returns the payload previously stored at that node, if any. The shape
    /// of the rest of the tree is left untouched.
    pub fn insert(&mut self, path: &str, separator: char, payload: T) -> Option<T> {
        let segments = split(path, separator);
        let start = usize::from(segments[0].is_empty());
        self.grow(&segments[start..], payload)
    }

    fn grow(&mut self, segments: &[&str], payload: T) -> Option<T> {
        let Some((head, rest)) = segments.split_first() else {
            return self.payload.replace(payload);
        };

        let index = match self.children.iter().position(|c| c.segment == *head) {
            Some(index) => index,
            None => {
                self.children.push(Node::new(*head));
                self.children.len() - 1
            }
        };
        self.children[index].grow(rest, payload)
    }

    /// Looks up `path` using [`DEFAULT_WILDCARD`].
    ///
    /// When a wildcard gives a path two valid end points, the one inserted
    /// earliest wins.
    #[must_use]
    pub fn lookup(&self, path: &str, separator: char) -> Lookup<'_, T> {
        self.lookup_with_wildcard(path, separator, DEFAULT_WILDCARD)
    }

    /// Looks up `path`, treating nodes whose segment equals `wildcard` as
    /// matching any single input segment.
    ///
    /// A path with a leading separator starts matching at this node. A path
    /// without one is tried against each child in turn, so `"/foo"` and
    /// `"foo"` resolve identically.
    #[must_use]
    pub fn lookup_with_wildcard(&self, path: &str, separator: char, wildcard: &str) -> Lookup<'_, T> {
        let segments = split(path, separator);

        let found = if segments[0].is_empty() {
            self.find(0, &segments, wildcard)
        } else {
            self.children
                .iter()
                .find_map(|child| child.find(0, &segments, wildcard))
        };

        match found {
            Some(Some(payload)) => Lookup::Payload(payload),
            Some(None) => Lookup::Waypoint,
            None => Lookup::NotFound,
        }
    }

    // Outer `None` is a failed match; inner `None` is a match on a node
    // without payload.
    fn find(&self, idx: usize, segments: &[&str], wildcard: &str) -> Option<Option<&T>> {
        if segments[idx] != self.segment && self.segment != wildcard {
            // A childless empty segment swallows whatever is left.
            if self.segment.is_empty() && self.children.is_empty() {
                return Some(self.payload.as_ref());
            }
            return None;
        }

        if idx + 1 == segments.len() {
            return Some(self.payload.as_ref());
        }

        self.children
            .iter()
            .find_map(|child| child.find(idx + 1, segments, wildcard))
    }
}

impl<T: fmt::Debug> fmt::Display for Node<T> {
    /// Renders the subtree as `{"segment"=payload,[children]}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"{}\"=", self.segment)?;
        match &self.payload {
            Some(payload) => write!(f, "{payload:?}")?,
            None => f.write_str("<nil>")?,
        }
        if let Some((first, rest)) = self.children.split_first() {
            write!(f, ",[{first}")?;
            for child in rest {
                write!(f, ",{child}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}
