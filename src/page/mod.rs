//! Host document capability.
//!
//! The scanner never touches a concrete DOM directly. Everything it needs from
//! the page goes through [`Document`]: querying containers, reading text out
//! of them, keeping the structural "seen" marker and attaching annotations.
//! Node handles are non-owning; a handle whose element the host has dropped
//! is stale and every mutating call treats it as a no-op.

use std::{fmt::Debug, hash::Hash};

use crate::domain::Annotation;

mod html;
pub mod strategy;

pub use html::HtmlDocument;
pub use strategy::ExtractionStrategy;

pub trait Document {
    /// Ordering of nodes must follow document order.
    type Node: Clone + Eq + Ord + Hash + Debug;

    /// Pick up host-side changes (re-render). Default is a static document.
    fn refresh(&mut self) {}

    /// Elements matching `selector`, in document order.
    fn query(&self, selector: &str) -> Vec<Self::Node>;

    /// True if `inner` is a strict descendant of `outer`.
    fn contains(&self, outer: &Self::Node, inner: &Self::Node) -> bool;

    /// Trimmed text of the first descendant of `node` matching `selector`.
    fn first_text(&self, node: &Self::Node, selector: &str) -> Option<String>;

    fn is_marked(&self, node: &Self::Node) -> bool;

    /// Marks `node` and all of its descendants as seen. Idempotent.
    fn mark(&mut self, node: &Self::Node);

    fn annotate(&mut self, node: &Self::Node, annotation: &Annotation);
}
