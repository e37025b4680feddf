//! Node data and vector math for the embedded graph store.

use uuid::Uuid;
use weft_core::types::EntityType;

/// Node data in the relationship graph.
///
/// Nodes are created in two ways: explicitly through registration (which
/// fills in resolution metadata) or implicitly as placeholders when a
/// relationship references an id the graph has not seen. Placeholders
/// never participate in name-based resolution.
#[derive(Debug, Clone)]
pub struct EntityNode {
    /// Entity identifier (shared with the world store).
    pub id: Uuid,
    /// Display name, empty for placeholders.
    pub name: String,
    /// Entity type, unknown for placeholders.
    pub entity_type: Option<EntityType>,
    /// Universe the entity is registered in; `None` marks prime/canon.
    pub universe_id: Option<Uuid>,
    /// Embedding vector for similarity search, if set.
    pub embedding: Option<Vec<f32>>,
    /// Whether the node was explicitly registered.
    pub registered: bool,
}

impl EntityNode {
    /// A placeholder node for an id referenced before registration.
    pub fn placeholder(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            entity_type: None,
            universe_id: None,
            embedding: None,
            registered: false,
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
