//! World store trait: branch-partitioned storage of universes, entities,
//! and events.
//!
//! There is deliberately no store-wide "current branch": every call names
//! its partition explicitly, either by branch name (branch lifecycle) or by
//! universe id (record access; the store resolves a universe id to its home
//! branch through a global index). Callers therefore cannot depend on
//! checkout ordering, and concurrent readers of different universes do not
//! interfere.

use uuid::Uuid;

use crate::error::WeftResult;
use crate::types::{Entity, EntityType, Event, Universe};

/// Branch-partitioned world store - both backends implement this.
///
/// One branch per universe. `create_branch` seeds the new partition with a
/// full snapshot of the source branch at that instant; afterwards the two
/// partitions evolve independently. Implementations assume a single
/// logical writer per branch and do not provide multi-writer locking.
pub trait WorldStore: Send + Sync {
    /// Name of the reserved root branch (home of the Prime universe).
    fn root_branch(&self) -> &str;

    /// Create `name` as a snapshot of `from_branch`.
    ///
    /// Fails with a branch error if `from_branch` does not exist or `name`
    /// is already taken. All-or-nothing: on failure no partition is
    /// created.
    fn create_branch(&self, name: &str, from_branch: &str) -> WeftResult<()>;

    /// Delete a branch and its partition.
    ///
    /// Fails for the root branch and for any branch that is still the home
    /// branch of a registered universe.
    fn delete_branch(&self, name: &str) -> WeftResult<()>;

    /// Whether a branch exists.
    fn branch_exists(&self, name: &str) -> WeftResult<bool>;

    /// All branch names, unordered.
    fn list_branches(&self) -> WeftResult<Vec<String>>;

    /// Persist a universe record on its own `branch_id` partition and in
    /// the global by-id index.
    fn save_universe(&self, universe: &Universe) -> WeftResult<()>;

    /// Authoritative by-id lookup, independent of any partition.
    fn get_universe(&self, id: Uuid) -> WeftResult<Option<Universe>>;

    /// The universe whose home branch is `branch`.
    fn get_universe_by_branch(&self, branch: &str) -> WeftResult<Option<Universe>>;

    /// All universes whose parent is `parent_id` (the fork-children
    /// secondary index).
    fn get_universes_by_parent(&self, parent_id: Uuid) -> WeftResult<Vec<Universe>>;

    /// Persist an entity in the partition of `universe_id`.
    ///
    /// The partition is named explicitly because a snapshot-seeded entity
    /// can be mutated on a descendant branch while its record still carries
    /// the ancestor's universe id.
    fn save_entity(&self, entity: &Entity, universe_id: Uuid) -> WeftResult<()>;

    /// Read an entity from the partition of `universe_id`; an id saved
    /// under a different branch is not found.
    fn get_entity(&self, id: Uuid, universe_id: Uuid) -> WeftResult<Option<Entity>>;

    /// All entities of a type within one universe's partition, order not
    /// significant.
    fn get_entities_by_type(
        &self,
        entity_type: EntityType,
        universe_id: Uuid,
    ) -> WeftResult<Vec<Entity>>;

    /// Append an event to the partition of `event.universe_id`.
    fn append_event(&self, event: &Event) -> WeftResult<()>;

    /// The full log of a universe's branch in ascending (timestamp,
    /// insertion) order, events inherited from the pre-fork snapshot
    /// included.
    fn get_events(&self, universe_id: Uuid) -> WeftResult<Vec<Event>>;

    /// Global by-id event lookup.
    fn get_event(&self, id: Uuid) -> WeftResult<Option<Event>>;
}
