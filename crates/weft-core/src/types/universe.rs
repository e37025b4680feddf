//! Universe (timeline) records.
//!
//! Universes form a tree rooted at the Prime timeline. Each universe owns
//! one branch of the world store, named by `branch_id`; forks snapshot the
//! parent's branch and then diverge independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum UniverseStatus {
    Active,
    Archived,
}

/// A timeline: one self-consistent version of the game world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    /// Unique universe identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Name of this universe's partition in the world store.
    pub branch_id: String,
    /// Parent universe; `None` only for Prime.
    pub parent_id: Option<Uuid>,
    /// Distance from Prime (Prime = 0, each fork = parent + 1).
    pub depth: u32,
    /// Lifecycle status.
    pub status: UniverseStatus,
    /// Player who owns this timeline, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    /// Free-form narrative seed data.
    #[serde(default)]
    pub world_context: String,
    /// Why this fork was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_reason: Option<String>,
    /// Event at which the fork occurred, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_point_event_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Universe {
    /// Create the Prime timeline on the given root branch.
    pub fn prime(name: impl Into<String>, root_branch: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            branch_id: root_branch.into(),
            parent_id: None,
            depth: 0,
            status: UniverseStatus::Active,
            owner_id: None,
            world_context: String::new(),
            fork_reason: None,
            fork_point_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a fork of `parent` with a fresh id and branch name.
    pub fn fork(
        parent: &Universe,
        name: impl Into<String>,
        branch_id: impl Into<String>,
        owner_id: Option<Uuid>,
        fork_reason: impl Into<String>,
        fork_point_event_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            branch_id: branch_id.into(),
            parent_id: Some(parent.id),
            depth: parent.depth + 1,
            status: UniverseStatus::Active,
            owner_id,
            world_context: parent.world_context.clone(),
            fork_reason: Some(fork_reason.into()),
            fork_point_event_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the Prime (root) timeline.
    pub fn is_prime(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether this universe accepts new forks and gameplay writes.
    pub fn is_active(&self) -> bool {
        self.status == UniverseStatus::Active
    }
}
