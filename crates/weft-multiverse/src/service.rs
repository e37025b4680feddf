//! The multiverse orchestration service.
//!
//! Holds both stores and enforces the cross-store invariants of fork,
//! travel, archive, and lineage. Cross-store steps commit independently in
//! a fixed order (universe before event; entity copy before variant link
//! before event), so an interrupted operation leaves state that is not yet
//! visible to gameplay rather than partially visible.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use weft_core::config::MultiverseConfig;
use weft_core::error::{WeftError, WeftResult};
use weft_core::traits::{GraphStore, WorldStore};
use weft_core::types::{Event, Universe, UniverseStatus};

use crate::results::{ForkResult, TravelResult};

/// Orchestrates fork, travel, archive, and lineage across both stores.
///
/// Not a concurrent data structure: a single logical writer per branch is
/// assumed, as in the underlying world store.
pub struct MultiverseService {
    world: Arc<dyn WorldStore>,
    graph: Arc<dyn GraphStore>,
    config: MultiverseConfig,
}

impl MultiverseService {
    pub fn new(world: Arc<dyn WorldStore>, graph: Arc<dyn GraphStore>) -> Self {
        Self::with_config(world, graph, MultiverseConfig::default())
    }

    pub fn with_config(
        world: Arc<dyn WorldStore>,
        graph: Arc<dyn GraphStore>,
        config: MultiverseConfig,
    ) -> Self {
        Self {
            world,
            graph,
            config,
        }
    }

    /// One-time creation of the Prime universe on the root branch.
    ///
    /// Fails with `InvalidState` if the root branch already hosts a
    /// universe.
    pub fn initialize_prime(&self, name: Option<&str>) -> WeftResult<Universe> {
        let root = self.world.root_branch().to_string();
        if self.world.get_universe_by_branch(&root)?.is_some() {
            return Err(WeftError::invalid_state(format!(
                "root branch '{root}' already hosts a universe"
            )));
        }
        let prime = Universe::prime(name.unwrap_or(&self.config.prime_name), &root);
        self.world.save_universe(&prime)?;
        tracing::info!(universe_id = %prime.id, name = %prime.name, "initialized Prime");
        Ok(prime)
    }

    /// Fork a new child timeline from an active parent.
    pub fn fork_universe(
        &self,
        parent_id: Uuid,
        name: &str,
        reason: &str,
        owner_id: Option<Uuid>,
        fork_point_event_id: Option<Uuid>,
    ) -> WeftResult<ForkResult> {
        let parent = match self.world.get_universe(parent_id)? {
            Some(parent) => parent,
            None => {
                return Ok(ForkResult::fail(format!(
                    "parent universe {parent_id} not found"
                )))
            }
        };
        if !parent.is_active() {
            return Ok(ForkResult::fail(format!(
                "parent universe '{}' is inactive (status {})",
                parent.name, parent.status
            )));
        }
        // Defensive: should not occur if invariants hold.
        if !self.world.branch_exists(&parent.branch_id)? {
            return Ok(ForkResult::fail(format!(
                "branch '{}' of parent universe '{}' does not exist",
                parent.branch_id, parent.name
            )));
        }

        let branch = self.fresh_branch_name(owner_id)?;
        self.world.create_branch(&branch, &parent.branch_id)?;

        let child = Universe::fork(&parent, name, &branch, owner_id, reason, fork_point_event_id);
        self.world.save_universe(&child)?;

        let actor = owner_id.unwrap_or_else(Uuid::new_v4);
        let event = Event::fork(parent.id, child.id, actor, reason, fork_point_event_id);
        self.world.append_event(&event)?;

        tracing::info!(
            parent_id = %parent.id,
            child_id = %child.id,
            branch = %branch,
            depth = child.depth,
            "forked universe"
        );
        Ok(ForkResult::ok(child, event))
    }

    /// Copy a character into another timeline, leaving the original
    /// untouched in the source universe.
    pub fn travel_between_worlds(
        &self,
        traveler_id: Uuid,
        source_id: Uuid,
        destination_id: Uuid,
        method: Option<&str>,
    ) -> WeftResult<TravelResult> {
        if self.world.get_universe(source_id)?.is_none() {
            return Ok(TravelResult::fail(format!(
                "source universe {source_id} not found"
            )));
        }
        if self.world.get_universe(destination_id)?.is_none() {
            return Ok(TravelResult::fail(format!(
                "destination universe {destination_id} not found"
            )));
        }
        let traveler = match self.world.get_entity(traveler_id, source_id)? {
            Some(traveler) => traveler,
            None => {
                return Ok(TravelResult::fail(format!(
                    "traveler {traveler_id} not found in source universe"
                )))
            }
        };
        if !traveler.is_character() {
            return Ok(TravelResult::fail(format!(
                "entity '{}' is {}; only characters may travel",
                traveler.name, traveler.entity_type
            )));
        }

        let copy = traveler.travel_copy(destination_id);
        self.world.save_entity(&copy, destination_id)?;
        self.graph
            .register_entity(copy.id, &copy.name, copy.entity_type, Some(destination_id))?;

        let mut changes = BTreeMap::new();
        changes.insert("travel_origin".to_string(), source_id.to_string());
        if let Err(err) = self
            .graph
            .create_variant_link(traveler.id, copy.id, destination_id, changes)
        {
            if err.is_recoverable() {
                return Ok(TravelResult::fail(err.to_string()));
            }
            return Err(err);
        }

        let method = method.unwrap_or(&self.config.default_travel_method);
        let event = Event::travel(
            traveler.id,
            copy.id,
            &copy.name,
            source_id,
            destination_id,
            method,
        );
        self.world.append_event(&event)?;

        tracing::info!(
            traveler_id = %traveler.id,
            copy_id = %copy.id,
            from = %source_id,
            to = %destination_id,
            method,
            "traveled between worlds"
        );
        Ok(TravelResult::ok(copy.id, event))
    }

    /// Soft-archive a universe. Returns `Ok(false)` for a missing universe
    /// or Prime; archived universes remain fully readable.
    pub fn archive_universe(&self, universe_id: Uuid) -> WeftResult<bool> {
        let mut universe = match self.world.get_universe(universe_id)? {
            Some(universe) => universe,
            None => {
                tracing::warn!(%universe_id, "archive requested for unknown universe");
                return Ok(false);
            }
        };
        if universe.is_prime() {
            tracing::warn!(%universe_id, "refusing to archive Prime");
            return Ok(false);
        }
        universe.status = UniverseStatus::Archived;
        universe.updated_at = Utc::now();
        self.world.save_universe(&universe)?;
        tracing::info!(%universe_id, name = %universe.name, "archived universe");
        Ok(true)
    }

    /// Ancestry of a universe in root-first order.
    ///
    /// A dangling parent reference truncates the walk silently; integrity
    /// gaps are not raised as errors at this layer.
    pub fn get_universe_lineage(&self, universe_id: Uuid) -> WeftResult<Vec<Universe>> {
        let mut lineage = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.world.get_universe(universe_id)?;
        while let Some(universe) = current {
            if !seen.insert(universe.id) {
                tracing::warn!(%universe_id, "cycle in universe lineage");
                break;
            }
            let parent_id = universe.parent_id;
            lineage.push(universe);
            current = match parent_id {
                Some(parent_id) => self.world.get_universe(parent_id)?,
                None => None,
            };
        }
        lineage.reverse();
        Ok(lineage)
    }

    /// All direct forks of a universe.
    pub fn get_fork_children(&self, universe_id: Uuid) -> WeftResult<Vec<Universe>> {
        self.world.get_universes_by_parent(universe_id)
    }

    /// A unique branch name, namespaced by owner when one is given.
    fn fresh_branch_name(&self, owner_id: Option<Uuid>) -> WeftResult<String> {
        loop {
            let suffix: String = Uuid::new_v4().simple().to_string()[..8].to_string();
            let candidate = match owner_id {
                Some(owner) => format!("user/{owner}/{suffix}"),
                None => format!("fork/{suffix}"),
            };
            if !self.world.branch_exists(&candidate)? {
                return Ok(candidate);
            }
        }
    }
}
