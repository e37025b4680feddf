//! Structured results for orchestration operations.
//!
//! Expected failures (missing universe, inactive parent, wrong entity
//! type) come back as failure results with a human-readable reason, so
//! call sites can narrate them without catching errors. Only store-level
//! faults surface as `WeftError`.

use serde::Serialize;
use uuid::Uuid;

use weft_core::types::{Event, Universe};

/// Outcome of a fork operation.
#[derive(Debug, Clone, Serialize)]
pub struct ForkResult {
    pub success: bool,
    /// The child universe, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe: Option<Universe>,
    /// The FORK event appended to the child's branch, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    /// Failure reason, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForkResult {
    pub fn ok(universe: Universe, event: Event) -> Self {
        Self {
            success: true,
            universe: Some(universe),
            event: Some(event),
            error: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            universe: None,
            event: None,
            error: Some(reason.into()),
        }
    }
}

/// Outcome of a cross-world travel operation.
#[derive(Debug, Clone, Serialize)]
pub struct TravelResult {
    pub success: bool,
    /// Id of the freshly minted copy in the destination universe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traveler_copy_id: Option<Uuid>,
    /// The TRAVEL event appended to the destination's branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
    /// Failure reason, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TravelResult {
    pub fn ok(traveler_copy_id: Uuid, event: Event) -> Self {
        Self {
            success: true,
            traveler_copy_id: Some(traveler_copy_id),
            event: Some(event),
            error: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            traveler_copy_id: None,
            event: None,
            error: Some(reason.into()),
        }
    }
}
