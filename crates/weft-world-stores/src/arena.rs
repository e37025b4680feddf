//! In-memory arena world store.
//!
//! Records are held as `Arc`-shared immutable values inside per-branch
//! index maps. Creating a branch clones the index maps, which copies Arc
//! pointers rather than records, so a fork shares storage with its parent
//! until either side writes. Externally this behaves exactly like a full
//! snapshot copy: a write on one partition replaces that partition's Arc
//! and is never visible through the other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use weft_core::error::{WeftError, WeftResult};
use weft_core::traits::WorldStore;
use weft_core::types::{Entity, EntityType, Event, Universe};

/// Default name of the reserved root branch.
pub const DEFAULT_ROOT_BRANCH: &str = "main";

#[derive(Default, Clone)]
struct Partition {
    universes: HashMap<Uuid, Arc<Universe>>,
    entities: HashMap<Uuid, Arc<Entity>>,
    /// Insertion order doubles as the timestamp tie-breaker.
    events: Vec<Arc<Event>>,
}

struct Inner {
    branches: HashMap<String, Partition>,
    /// Authoritative universe records (home-branch copy), keyed globally.
    universes_by_id: HashMap<Uuid, Arc<Universe>>,
    /// Events are immutable, so the global index can serve lookups for
    /// every branch that carries a snapshot copy.
    events_by_id: HashMap<Uuid, Arc<Event>>,
}

/// In-memory branch-partitioned world store.
pub struct ArenaWorldStore {
    root_branch: String,
    inner: Mutex<Inner>,
}

impl ArenaWorldStore {
    /// Create a store with the default `main` root branch.
    pub fn new() -> Self {
        Self::with_root_branch(DEFAULT_ROOT_BRANCH)
    }

    /// Create a store with a custom root branch name.
    pub fn with_root_branch(root_branch: impl Into<String>) -> Self {
        let root_branch = root_branch.into();
        let mut branches = HashMap::new();
        branches.insert(root_branch.clone(), Partition::default());
        Self {
            root_branch,
            inner: Mutex::new(Inner {
                branches,
                universes_by_id: HashMap::new(),
                events_by_id: HashMap::new(),
            }),
        }
    }

    fn home_branch(inner: &Inner, universe_id: Uuid) -> Option<String> {
        inner
            .universes_by_id
            .get(&universe_id)
            .map(|u| u.branch_id.clone())
    }
}

impl Default for ArenaWorldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStore for ArenaWorldStore {
    fn root_branch(&self) -> &str {
        &self.root_branch
    }

    fn create_branch(&self, name: &str, from_branch: &str) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.branches.contains_key(name) {
            return Err(WeftError::branch(format!("branch '{name}' already exists")));
        }
        let snapshot = inner
            .branches
            .get(from_branch)
            .ok_or_else(|| WeftError::branch(format!("branch '{from_branch}' does not exist")))?
            .clone();
        inner.branches.insert(name.to_string(), snapshot);
        tracing::debug!(branch = name, from = from_branch, "created branch");
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if name == self.root_branch {
            return Err(WeftError::invalid_operation(format!(
                "cannot delete the root branch '{name}'"
            )));
        }
        if inner
            .universes_by_id
            .values()
            .any(|u| u.branch_id == name)
        {
            return Err(WeftError::invalid_operation(format!(
                "branch '{name}' is the home branch of a universe"
            )));
        }
        if inner.branches.remove(name).is_none() {
            return Err(WeftError::branch(format!("branch '{name}' does not exist")));
        }
        tracing::debug!(branch = name, "deleted branch");
        Ok(())
    }

    fn branch_exists(&self, name: &str) -> WeftResult<bool> {
        Ok(self.inner.lock().unwrap().branches.contains_key(name))
    }

    fn list_branches(&self) -> WeftResult<Vec<String>> {
        Ok(self.inner.lock().unwrap().branches.keys().cloned().collect())
    }

    fn save_universe(&self, universe: &Universe) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = Arc::new(universe.clone());
        let partition = inner.branches.get_mut(&universe.branch_id).ok_or_else(|| {
            WeftError::branch(format!(
                "home branch '{}' of universe '{}' does not exist",
                universe.branch_id, universe.name
            ))
        })?;
        partition.universes.insert(universe.id, Arc::clone(&record));
        inner.universes_by_id.insert(universe.id, record);
        Ok(())
    }

    fn get_universe(&self, id: Uuid) -> WeftResult<Option<Universe>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.universes_by_id.get(&id).map(|u| (**u).clone()))
    }

    fn get_universe_by_branch(&self, branch: &str) -> WeftResult<Option<Universe>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .universes_by_id
            .values()
            .find(|u| u.branch_id == branch)
            .map(|u| (**u).clone()))
    }

    fn get_universes_by_parent(&self, parent_id: Uuid) -> WeftResult<Vec<Universe>> {
        let inner = self.inner.lock().unwrap();
        let mut children: Vec<Universe> = inner
            .universes_by_id
            .values()
            .filter(|u| u.parent_id == Some(parent_id))
            .map(|u| (**u).clone())
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    fn save_entity(&self, entity: &Entity, universe_id: Uuid) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let branch = Self::home_branch(&inner, universe_id)
            .ok_or_else(|| WeftError::not_found(format!("universe {universe_id} not found")))?;
        let partition = inner
            .branches
            .get_mut(&branch)
            .ok_or_else(|| WeftError::branch(format!("branch '{branch}' does not exist")))?;
        partition.entities.insert(entity.id, Arc::new(entity.clone()));
        Ok(())
    }

    fn get_entity(&self, id: Uuid, universe_id: Uuid) -> WeftResult<Option<Entity>> {
        let inner = self.inner.lock().unwrap();
        let branch = match Self::home_branch(&inner, universe_id) {
            Some(branch) => branch,
            None => return Ok(None),
        };
        Ok(inner
            .branches
            .get(&branch)
            .and_then(|p| p.entities.get(&id))
            .map(|e| (**e).clone()))
    }

    fn get_entities_by_type(
        &self,
        entity_type: EntityType,
        universe_id: Uuid,
    ) -> WeftResult<Vec<Entity>> {
        let inner = self.inner.lock().unwrap();
        let branch = match Self::home_branch(&inner, universe_id) {
            Some(branch) => branch,
            None => return Ok(Vec::new()),
        };
        Ok(inner
            .branches
            .get(&branch)
            .map(|p| {
                p.entities
                    .values()
                    .filter(|e| e.entity_type == entity_type)
                    .map(|e| (**e).clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn append_event(&self, event: &Event) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let branch = Self::home_branch(&inner, event.universe_id).ok_or_else(|| {
            WeftError::not_found(format!("universe {} not found", event.universe_id))
        })?;
        let record = Arc::new(event.clone());
        let partition = inner
            .branches
            .get_mut(&branch)
            .ok_or_else(|| WeftError::branch(format!("branch '{branch}' does not exist")))?;
        partition.events.push(Arc::clone(&record));
        inner.events_by_id.insert(event.id, record);
        Ok(())
    }

    fn get_events(&self, universe_id: Uuid) -> WeftResult<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        let branch = match Self::home_branch(&inner, universe_id) {
            Some(branch) => branch,
            None => return Ok(Vec::new()),
        };
        let mut events: Vec<Event> = inner
            .branches
            .get(&branch)
            .map(|p| p.events.iter().map(|e| (**e).clone()).collect())
            .unwrap_or_default();
        // Stable sort: insertion order breaks timestamp ties.
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn get_event(&self, id: Uuid) -> WeftResult<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events_by_id.get(&id).map(|e| (**e).clone()))
    }
}
