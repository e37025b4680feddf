//! weft-core - Core library for weft.
//!
//! This crate provides the record types, store traits, and error
//! hierarchy for the weft multiverse layer: a git-like branching model
//! over narrative game-world state, split across a branch-partitioned
//! entity/event store and a graph overlay store.
//!
//! # Example
//!
//! ```ignore
//! use weft_core::{MultiverseConfig, WorldStore};
//!
//! let config = MultiverseConfig::default();
//! store.create_branch("fork/what-if", &config.root_branch)?;
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::MultiverseConfig;
pub use error::{WeftError, WeftResult};
pub use traits::{GraphStore, WorldStore};
pub use types::{
    Entity, EntityType, Event, EventOutcome, EventType, MemoryType, NpcMemory, Relationship,
    RelationshipCategory, RelationshipKind, RelationshipTag, Universe, UniverseStatus,
};
