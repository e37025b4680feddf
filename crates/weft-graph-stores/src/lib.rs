//! weft-graph-stores - Graph store implementations for weft.
//!
//! The graph overlay holds what the branch-partitioned world store does
//! not: typed relationships between entities, NPC memories, variant links
//! across timelines, and name-based identity resolution.
//!
//! [`EmbeddedGraphStore`] is the in-process implementation, backed by
//! petgraph.

pub mod embedded;

pub use embedded::{cosine_similarity, EmbeddedGraphStore, EntityNode};
