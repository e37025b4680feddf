//! Game entities: characters, locations, items, factions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed set of entity types.
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
pub enum EntityType {
    Character,
    Location,
    Item,
    Faction,
    Concept,
}

/// A game object scoped to one universe.
///
/// Entities are mutated in place within their universe. Identity never
/// migrates across universes: cross-world travel mints a copy with a fresh
/// id via [`Entity::travel_copy`], and the original stays behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique entity identifier.
    pub id: Uuid,
    /// Universe this entity belongs to.
    pub universe_id: Uuid,
    /// Entity type.
    pub entity_type: EntityType,
    /// Display name.
    pub name: String,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
    /// Structured gameplay attributes (stats, inventory hooks, tags).
    #[serde(default)]
    pub attributes: serde_json::Value,
    /// Current location, if placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new entity in a universe.
    pub fn new(universe_id: Uuid, entity_type: EntityType, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            universe_id,
            entity_type,
            name: name.into(),
            description: String::new(),
            attributes: serde_json::Value::Null,
            current_location_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this entity may travel between worlds.
    pub fn is_character(&self) -> bool {
        self.entity_type == EntityType::Character
    }

    /// Deep copy of this entity bound to a destination universe.
    ///
    /// The copy gets a fresh id, fresh timestamps, and no current location;
    /// it must find a new place in the destination world.
    pub fn travel_copy(&self, destination_universe_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            universe_id: destination_universe_id,
            current_location_id: None,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}
