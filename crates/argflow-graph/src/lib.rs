//! Identity-keyed weighted digraph.
//!
//! This crate holds the graph primitive underneath the argflow resolver.
//! It knows nothing about values, converters, or functions -- it stores
//! vertices addressed by a stable identity key, weighted directed edges,
//! and provides the traversals the resolver needs: visitor-driven DFS,
//! shortest paths with predecessor tracking, and a deterministic printer
//! for diagnostics.

pub mod graph;

pub use graph::{Direction, Graph, GraphVertex, PathMap};
