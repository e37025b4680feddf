//! Core record types shared by both stores and the orchestration layer.

pub mod entity;
pub mod event;
pub mod npc_memory;
pub mod relationship;
pub mod universe;

pub use entity::{Entity, EntityType};
pub use event::{Event, EventOutcome, EventType};
pub use npc_memory::{MemoryType, NpcMemory};
pub use relationship::{Relationship, RelationshipCategory, RelationshipKind, RelationshipTag};
pub use universe::{Universe, UniverseStatus};
