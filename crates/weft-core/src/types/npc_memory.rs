//! NPC memory nodes for the graph overlay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of memory an NPC holds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemoryType {
    Observation,
    Interaction,
    Rumor,
    Reflection,
}

/// A memory owned by exactly one NPC, ordered by recency for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemory {
    /// Unique memory identifier.
    pub id: Uuid,
    /// NPC that holds this memory.
    pub npc_id: Uuid,
    /// Kind of memory.
    pub memory_type: MemoryType,
    /// Entity this memory is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<Uuid>,
    /// What the NPC remembers.
    pub description: String,
    /// Emotional charge of the memory (-1 to 1).
    pub emotional_valence: f32,
    /// How important the memory is (0 to 1).
    pub importance: f32,
    /// Event that produced this memory, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    /// When the remembered thing happened.
    pub timestamp: DateTime<Utc>,
    /// How often the memory has been recalled.
    pub times_recalled: u32,
    /// Last recall time, if ever recalled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_recalled: Option<DateTime<Utc>>,
}

impl NpcMemory {
    /// Create a memory with neutral valence and middling importance.
    pub fn new(npc_id: Uuid, memory_type: MemoryType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            npc_id,
            memory_type,
            subject_id: None,
            description: description.into(),
            emotional_valence: 0.0,
            importance: 0.5,
            event_id: None,
            timestamp: Utc::now(),
            times_recalled: 0,
            last_recalled: None,
        }
    }

    /// Builder: set the subject entity.
    pub fn about(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    /// Builder: set the source event.
    pub fn from_event(mut self, event_id: Uuid) -> Self {
        self.event_id = Some(event_id);
        self
    }

    /// Builder: set importance.
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance;
        self
    }

    /// Builder: set emotional valence.
    pub fn with_valence(mut self, valence: f32) -> Self {
        self.emotional_valence = valence;
        self
    }
}
