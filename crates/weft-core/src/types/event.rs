//! Immutable event records: the append-only facts of a timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of fact recorded in a universe's log.
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
pub enum EventType {
    Dialogue,
    Travel,
    Fork,
    Combat,
    Discovery,
    System,
}

/// How an event resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventOutcome {
    Success,
    Failure,
    Partial,
    Neutral,
}

/// An immutable, timestamped fact appended to a universe's log.
///
/// Events are never updated or deleted. Within a universe they are ordered
/// by timestamp, ties broken by insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Universe whose log this event belongs to.
    pub universe_id: Uuid,
    /// Kind of event.
    pub event_type: EventType,
    /// Entity that caused the event.
    pub actor_id: Uuid,
    /// How the event resolved.
    pub outcome: EventOutcome,
    /// Structured payload.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Optional prose summary for narration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative_summary: Option<String>,
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event with an empty payload.
    pub fn new(universe_id: Uuid, event_type: EventType, actor_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            universe_id,
            event_type,
            actor_id,
            outcome: EventOutcome::Success,
            payload: serde_json::Value::Null,
            narrative_summary: None,
            timestamp: Utc::now(),
        }
    }

    /// The FORK event appended to a child's branch when a timeline splits.
    pub fn fork(
        parent_universe_id: Uuid,
        child_universe_id: Uuid,
        actor_id: Uuid,
        fork_reason: &str,
        fork_point_event_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            universe_id: child_universe_id,
            event_type: EventType::Fork,
            actor_id,
            outcome: EventOutcome::Success,
            payload: serde_json::json!({
                "fork_reason": fork_reason,
                "parent_universe_id": parent_universe_id,
                "child_universe_id": child_universe_id,
                "fork_point_event_id": fork_point_event_id,
            }),
            narrative_summary: Some(format!("The timeline split: {fork_reason}")),
            timestamp: Utc::now(),
        }
    }

    /// The TRAVEL event appended to the destination's branch when a
    /// character crosses worlds.
    pub fn travel(
        original_entity_id: Uuid,
        traveler_copy_id: Uuid,
        traveler_name: &str,
        from_universe_id: Uuid,
        to_universe_id: Uuid,
        travel_method: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            universe_id: to_universe_id,
            event_type: EventType::Travel,
            actor_id: traveler_copy_id,
            outcome: EventOutcome::Success,
            payload: serde_json::json!({
                "original_entity_id": original_entity_id,
                "from_universe_id": from_universe_id,
                "to_universe_id": to_universe_id,
                "travel_method": travel_method,
            }),
            narrative_summary: Some(format!(
                "{traveler_name} traveled from another world via {travel_method}."
            )),
            timestamp: Utc::now(),
        }
    }

    /// Builder: set the outcome.
    pub fn with_outcome(mut self, outcome: EventOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Builder: set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Builder: set the narrative summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.narrative_summary = Some(summary.into());
        self
    }
}
