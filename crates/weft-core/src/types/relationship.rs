//! Typed relationship edges for the graph overlay.
//!
//! Relationship kinds are a closed enum rather than free-form type
//! strings, so resolution logic is exhaustively checked. Distinguished
//! kinds carry their extra fields as variant data; the strum-derived
//! [`RelationshipTag`] discriminant gives every kind a stable
//! SCREAMING_SNAKE_CASE label and serves as the filter key for queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse grouping of relationship kinds by endpoint categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipCategory {
    CharacterToCharacter,
    CharacterToLocation,
    CharacterToItem,
    Faction,
    LocationToLocation,
    CrossTimeline,
}

/// The kind of a relationship edge, with per-kind extra fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::EnumDiscriminants)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum_discriminants(name(RelationshipTag))]
#[strum_discriminants(derive(Hash, strum::Display, strum::EnumString))]
#[strum_discriminants(strum(serialize_all = "SCREAMING_SNAKE_CASE"))]
pub enum RelationshipKind {
    // Character-to-character
    Knows { familiarity: f32 },
    AlliedWith,
    HostileTo,
    Serves,
    Loves,
    Fears { intensity: f32, is_phobia: bool },

    // Character-to-location
    LocatedIn { is_current: bool },
    LivesIn,
    Visited,

    // Character-to-item
    Carries,
    Owns,

    // Faction membership and faction-to-faction
    MemberOf,
    Leads,
    Opposes,
    TradesWith,
    Influences,

    // Location-to-location
    ConnectedTo,
    Contains,

    // Cross-timeline: variant entity -> original entity
    VariantOf {
        changes: BTreeMap<String, String>,
        diverged_at_event_id: Option<Uuid>,
    },
}

impl RelationshipKind {
    /// Discriminant label of this kind.
    pub fn tag(&self) -> RelationshipTag {
        RelationshipTag::from(self)
    }

    /// Endpoint category of this kind, checked exhaustively.
    pub fn category(&self) -> RelationshipCategory {
        match self {
            Self::Knows { .. }
            | Self::AlliedWith
            | Self::HostileTo
            | Self::Serves
            | Self::Loves
            | Self::Fears { .. } => RelationshipCategory::CharacterToCharacter,
            Self::LocatedIn { .. } | Self::LivesIn | Self::Visited => {
                RelationshipCategory::CharacterToLocation
            }
            Self::Carries | Self::Owns => RelationshipCategory::CharacterToItem,
            Self::MemberOf | Self::Leads | Self::Opposes | Self::TradesWith | Self::Influences => {
                RelationshipCategory::Faction
            }
            Self::ConnectedTo | Self::Contains => RelationshipCategory::LocationToLocation,
            Self::VariantOf { .. } => RelationshipCategory::CrossTimeline,
        }
    }
}

/// A directed, typed edge between two entities, scoped to a universe.
///
/// Relationships capture the soft state of the world: connections,
/// feelings, and the cross-timeline variant links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique relationship identifier.
    pub id: Uuid,
    /// Timeline this relationship exists in (a plain attribute, not a
    /// store partition).
    pub universe_id: Uuid,
    /// Source entity.
    pub from_entity_id: Uuid,
    /// Target entity.
    pub to_entity_id: Uuid,
    /// Kind, with per-kind extra fields.
    pub kind: RelationshipKind,
    /// How strong the relationship is (0 to 1).
    pub strength: f32,
    /// Trust level (-1 to 1), where that makes sense.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<f32>,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
    /// When the relationship was established.
    pub established_at: DateTime<Utc>,
    /// Last time the relationship was exercised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl Relationship {
    /// Create a relationship with default strength.
    pub fn new(universe_id: Uuid, from: Uuid, to: Uuid, kind: RelationshipKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            universe_id,
            from_entity_id: from,
            to_entity_id: to,
            kind,
            strength: 1.0,
            trust: None,
            description: String::new(),
            established_at: Utc::now(),
            last_interaction: None,
            is_active: true,
        }
    }

    /// A KNOWS edge between two characters.
    pub fn knows(universe_id: Uuid, from: Uuid, to: Uuid, trust: f32, familiarity: f32) -> Self {
        let mut rel = Self::new(universe_id, from, to, RelationshipKind::Knows { familiarity });
        rel.trust = Some(trust);
        rel
    }

    /// A LOCATED_IN edge marking an entity's current location.
    pub fn located_in(universe_id: Uuid, entity: Uuid, location: Uuid) -> Self {
        Self::new(
            universe_id,
            entity,
            location,
            RelationshipKind::LocatedIn { is_current: true },
        )
    }

    /// A VARIANT_OF edge from a variant entity to its original.
    pub fn variant_of(
        variant_universe_id: Uuid,
        variant: Uuid,
        original: Uuid,
        changes: BTreeMap<String, String>,
        diverged_at_event_id: Option<Uuid>,
    ) -> Self {
        Self::new(
            variant_universe_id,
            variant,
            original,
            RelationshipKind::VariantOf {
                changes,
                diverged_at_event_id,
            },
        )
    }

    /// Builder: set strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Builder: set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
