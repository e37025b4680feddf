//! Graph store trait: the relationship/memory overlay and cross-timeline
//! identity resolution.
//!
//! The overlay is not branch-partitioned; edges carry a universe id as a
//! plain attribute. Queries against unknown ids return empty results, not
//! errors, and writes that reference entities not yet registered still
//! succeed structurally - callers are responsible for registering entities
//! before relying on name-based resolution.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::WeftResult;
use crate::types::{EntityType, NpcMemory, Relationship, RelationshipTag};

/// Relationship and memory graph over entity identifiers.
pub trait GraphStore: Send + Sync {
    /// Create a relationship edge, auto-creating placeholder endpoint
    /// nodes as needed.
    fn create_relationship(&self, relationship: &Relationship) -> WeftResult<()>;

    /// All relationships touching an entity (either direction) in a
    /// universe, optionally filtered by kind.
    fn get_relationships(
        &self,
        entity_id: Uuid,
        universe_id: Uuid,
        kind: Option<RelationshipTag>,
    ) -> WeftResult<Vec<Relationship>>;

    /// Update an existing relationship's kind and properties; endpoints
    /// are immutable. NotFound error for an unknown id.
    fn update_relationship(&self, relationship: &Relationship) -> WeftResult<()>;

    /// Delete a relationship. No-op for an unknown id.
    fn delete_relationship(&self, relationship_id: Uuid) -> WeftResult<()>;

    /// Upsert the minimal metadata needed for name-based resolution.
    /// Idempotent. `universe_id = None` registers the entity as
    /// prime/canon.
    fn register_entity(
        &self,
        entity_id: Uuid,
        name: &str,
        entity_type: EntityType,
        universe_id: Option<Uuid>,
    ) -> WeftResult<()>;

    /// Link a variant entity in `variant_universe_id` to its original.
    ///
    /// Fails with an invalid-operation error if the original already has a
    /// live variant in that universe.
    fn create_variant_link(
        &self,
        original_id: Uuid,
        variant_id: Uuid,
        variant_universe_id: Uuid,
        changes: BTreeMap<String, String>,
    ) -> WeftResult<()>;

    /// Whether `original_id` has a variant in `universe_id`.
    fn has_variant(&self, original_id: Uuid, universe_id: Uuid) -> WeftResult<bool>;

    /// Resolve a name to an entity id within a universe.
    ///
    /// Strict precedence, first match wins: an entity registered directly
    /// in the universe; a variant in the universe whose original matches;
    /// a prime/canon entity with no variant in this universe. "Most
    /// specific wins", then "known divergence", then "unmodified canon".
    fn get_entity_in_universe(
        &self,
        name: &str,
        universe_id: Uuid,
        entity_type: Option<EntityType>,
    ) -> WeftResult<Option<Uuid>>;

    /// Distinct entity ids reachable within `max_depth` hops over edges
    /// tagged with `universe_id`, either direction.
    fn find_connected_entities(
        &self,
        entity_id: Uuid,
        universe_id: Uuid,
        max_depth: usize,
    ) -> WeftResult<Vec<Uuid>>;

    /// Shortest path by hop count over the universe-filtered edge set, or
    /// `None` when disconnected.
    fn find_path(
        &self,
        from_entity_id: Uuid,
        to_entity_id: Uuid,
        universe_id: Uuid,
    ) -> WeftResult<Option<Vec<Uuid>>>;

    /// Attach an embedding vector to an entity.
    fn set_embedding(&self, entity_id: Uuid, embedding: Vec<f32>) -> WeftResult<()>;

    /// The `limit` entities in a universe with highest cosine similarity
    /// to the query vector, descending, ties broken by ascending id.
    fn similarity_search(
        &self,
        query: &[f32],
        universe_id: Uuid,
        limit: usize,
    ) -> WeftResult<Vec<(Uuid, f32)>>;

    /// Store an NPC memory.
    fn create_memory(&self, memory: &NpcMemory) -> WeftResult<()>;

    /// An NPC's memories, newest first, capped at `limit`.
    fn get_memories_for_npc(&self, npc_id: Uuid, limit: usize) -> WeftResult<Vec<NpcMemory>>;

    /// An NPC's memories about a specific entity, newest first.
    fn get_memories_about_entity(
        &self,
        npc_id: Uuid,
        subject_id: Uuid,
        limit: usize,
    ) -> WeftResult<Vec<NpcMemory>>;

    /// Increment a memory's recall counter and stamp the recall time.
    /// No-op for an unknown id.
    fn update_memory_recall(&self, memory_id: Uuid) -> WeftResult<()>;

    /// Delete a memory (corrective operation). No-op for an unknown id.
    fn delete_memory(&self, memory_id: Uuid) -> WeftResult<()>;
}
