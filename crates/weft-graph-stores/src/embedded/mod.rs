//! Embedded in-process graph store.
//!
//! A petgraph `StableDiGraph` holds entity nodes and typed relationship
//! edges; side indexes give O(1) id lookups and per-NPC memory lists. The
//! stable graph keeps node and edge indices valid across removals, so the
//! id indexes never need repair.
//!
//! The graph is universe-agnostic at the node level: an entity node exists
//! once, and each edge carries the universe it belongs to as an attribute.
//! Universe filtering happens at query time.

mod node;

pub use node::{cosine_similarity, EntityNode};

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use uuid::Uuid;

use weft_core::error::{WeftError, WeftResult};
use weft_core::traits::GraphStore;
use weft_core::types::{
    EntityType, NpcMemory, Relationship, RelationshipKind, RelationshipTag,
};

type WorldGraph = StableDiGraph<EntityNode, Relationship>;

struct Inner {
    graph: WorldGraph,
    node_index: HashMap<Uuid, NodeIndex>,
    edge_index: HashMap<Uuid, EdgeIndex>,
    memories: HashMap<Uuid, NpcMemory>,
    memories_by_npc: HashMap<Uuid, Vec<Uuid>>,
}

/// In-process graph store backed by petgraph.
pub struct EmbeddedGraphStore {
    inner: Mutex<Inner>,
}

impl EmbeddedGraphStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                graph: WorldGraph::default(),
                node_index: HashMap::new(),
                edge_index: HashMap::new(),
                memories: HashMap::new(),
                memories_by_npc: HashMap::new(),
            }),
        }
    }

    fn ensure_node(inner: &mut Inner, id: Uuid) -> NodeIndex {
        if let Some(idx) = inner.node_index.get(&id) {
            return *idx;
        }
        let idx = inner.graph.add_node(EntityNode::placeholder(id));
        inner.node_index.insert(id, idx);
        idx
    }

    /// Edges touching `idx` in either direction, filtered to active edges
    /// of one universe.
    fn universe_edges(
        inner: &Inner,
        idx: NodeIndex,
        universe_id: Uuid,
    ) -> Vec<(NodeIndex, NodeIndex, Relationship)> {
        let mut edges = Vec::new();
        for edge in inner.graph.edges_directed(idx, Direction::Outgoing) {
            let rel = edge.weight();
            if rel.universe_id == universe_id && rel.is_active {
                edges.push((edge.source(), edge.target(), rel.clone()));
            }
        }
        for edge in inner.graph.edges_directed(idx, Direction::Incoming) {
            let rel = edge.weight();
            if rel.universe_id == universe_id && rel.is_active {
                edges.push((edge.source(), edge.target(), rel.clone()));
            }
        }
        edges
    }

    /// Neighbor entity ids over the universe-filtered edge set, sorted for
    /// deterministic traversal order.
    fn neighbors(inner: &Inner, id: Uuid, universe_id: Uuid) -> Vec<Uuid> {
        let idx = match inner.node_index.get(&id) {
            Some(idx) => *idx,
            None => return Vec::new(),
        };
        let mut out: Vec<Uuid> = Self::universe_edges(inner, idx, universe_id)
            .into_iter()
            .map(|(source, target, _)| {
                let other = if source == idx { target } else { source };
                inner.graph[other].id
            })
            .filter(|other| *other != id)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    fn add_edge_inner(inner: &mut Inner, relationship: &Relationship) -> WeftResult<()> {
        if inner.edge_index.contains_key(&relationship.id) {
            return Err(WeftError::invalid_operation(format!(
                "relationship {} already exists",
                relationship.id
            )));
        }
        let from = Self::ensure_node(inner, relationship.from_entity_id);
        let to = Self::ensure_node(inner, relationship.to_entity_id);
        let edge = inner.graph.add_edge(from, to, relationship.clone());
        inner.edge_index.insert(relationship.id, edge);
        Ok(())
    }

    /// Live variant of `original` in `universe_id`, if any.
    fn variant_in_universe(inner: &Inner, original: NodeIndex, universe_id: Uuid) -> Option<Uuid> {
        inner
            .graph
            .edges_directed(original, Direction::Incoming)
            .filter(|edge| {
                let rel = edge.weight();
                rel.is_active
                    && rel.universe_id == universe_id
                    && matches!(rel.kind, RelationshipKind::VariantOf { .. })
            })
            .map(|edge| inner.graph[edge.source()].id)
            .min()
    }

    fn node_matches(node: &EntityNode, name: &str, entity_type: Option<EntityType>) -> bool {
        if !node.registered || node.name != name {
            return false;
        }
        match (entity_type, node.entity_type) {
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl Default for EmbeddedGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for EmbeddedGraphStore {
    fn create_relationship(&self, relationship: &Relationship) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::add_edge_inner(&mut inner, relationship)?;
        tracing::debug!(
            relationship_id = %relationship.id,
            kind = %relationship.kind.tag(),
            "created relationship"
        );
        Ok(())
    }

    fn get_relationships(
        &self,
        entity_id: Uuid,
        universe_id: Uuid,
        kind: Option<RelationshipTag>,
    ) -> WeftResult<Vec<Relationship>> {
        let inner = self.inner.lock().unwrap();
        let idx = match inner.node_index.get(&entity_id) {
            Some(idx) => *idx,
            None => return Ok(Vec::new()),
        };
        let mut relationships: Vec<Relationship> =
            Self::universe_edges(&inner, idx, universe_id)
                .into_iter()
                .map(|(_, _, rel)| rel)
                .filter(|rel| kind.map_or(true, |tag| rel.kind.tag() == tag))
                .collect();
        relationships.sort_by(|a, b| {
            a.established_at
                .cmp(&b.established_at)
                .then(a.id.cmp(&b.id))
        });
        relationships.dedup_by_key(|rel| rel.id);
        Ok(relationships)
    }

    fn update_relationship(&self, relationship: &Relationship) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let edge = *inner.edge_index.get(&relationship.id).ok_or_else(|| {
            WeftError::not_found(format!("relationship {} not found", relationship.id))
        })?;
        let (from, to) = inner
            .graph
            .edge_endpoints(edge)
            .ok_or_else(|| WeftError::Internal("edge index out of sync".to_string()))?;
        if inner.graph[from].id != relationship.from_entity_id
            || inner.graph[to].id != relationship.to_entity_id
        {
            return Err(WeftError::invalid_operation(format!(
                "relationship {} endpoints cannot change",
                relationship.id
            )));
        }
        inner.graph[edge] = relationship.clone();
        Ok(())
    }

    fn delete_relationship(&self, relationship_id: Uuid) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(edge) = inner.edge_index.remove(&relationship_id) {
            inner.graph.remove_edge(edge);
        }
        Ok(())
    }

    fn register_entity(
        &self,
        entity_id: Uuid,
        name: &str,
        entity_type: EntityType,
        universe_id: Option<Uuid>,
    ) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let idx = Self::ensure_node(&mut inner, entity_id);
        let node = &mut inner.graph[idx];
        node.name = name.to_string();
        node.entity_type = Some(entity_type);
        node.universe_id = universe_id;
        node.registered = true;
        Ok(())
    }

    fn create_variant_link(
        &self,
        original_id: Uuid,
        variant_id: Uuid,
        variant_universe_id: Uuid,
        changes: BTreeMap<String, String>,
    ) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let original = Self::ensure_node(&mut inner, original_id);
        if Self::variant_in_universe(&inner, original, variant_universe_id).is_some() {
            return Err(WeftError::invalid_operation(format!(
                "entity {original_id} already has a variant in universe {variant_universe_id}"
            )));
        }
        let link =
            Relationship::variant_of(variant_universe_id, variant_id, original_id, changes, None);
        Self::add_edge_inner(&mut inner, &link)?;
        tracing::debug!(
            original = %original_id,
            variant = %variant_id,
            universe = %variant_universe_id,
            "created variant link"
        );
        Ok(())
    }

    fn has_variant(&self, original_id: Uuid, universe_id: Uuid) -> WeftResult<bool> {
        let inner = self.inner.lock().unwrap();
        let idx = match inner.node_index.get(&original_id) {
            Some(idx) => *idx,
            None => return Ok(false),
        };
        Ok(Self::variant_in_universe(&inner, idx, universe_id).is_some())
    }

    fn get_entity_in_universe(
        &self,
        name: &str,
        universe_id: Uuid,
        entity_type: Option<EntityType>,
    ) -> WeftResult<Option<Uuid>> {
        let inner = self.inner.lock().unwrap();

        // 1. An entity registered directly in the universe.
        let direct = inner
            .graph
            .node_weights()
            .filter(|node| {
                node.universe_id == Some(universe_id)
                    && Self::node_matches(node, name, entity_type)
            })
            .map(|node| node.id)
            .min();
        if direct.is_some() {
            return Ok(direct);
        }

        // 2. A variant in the universe whose original matches.
        let via_variant = inner
            .graph
            .node_weights()
            .filter(|node| Self::node_matches(node, name, entity_type))
            .filter_map(|node| {
                let idx = inner.node_index.get(&node.id)?;
                Self::variant_in_universe(&inner, *idx, universe_id)
            })
            .min();
        if via_variant.is_some() {
            return Ok(via_variant);
        }

        // 3. Unmodified canon: a prime entity with no variant here.
        let canon = inner
            .graph
            .node_weights()
            .filter(|node| {
                node.universe_id.is_none() && Self::node_matches(node, name, entity_type)
            })
            .filter(|node| {
                inner
                    .node_index
                    .get(&node.id)
                    .map_or(true, |idx| {
                        Self::variant_in_universe(&inner, *idx, universe_id).is_none()
                    })
            })
            .map(|node| node.id)
            .min();
        Ok(canon)
    }

    fn find_connected_entities(
        &self,
        entity_id: Uuid,
        universe_id: Uuid,
        max_depth: usize,
    ) -> WeftResult<Vec<Uuid>> {
        let inner = self.inner.lock().unwrap();
        if !inner.node_index.contains_key(&entity_id) {
            return Ok(Vec::new());
        }

        let mut visited = HashSet::from([entity_id]);
        let mut frontier = VecDeque::from([(entity_id, 0usize)]);
        let mut reached = Vec::new();
        while let Some((current, depth)) = frontier.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for neighbor in Self::neighbors(&inner, current, universe_id) {
                if visited.insert(neighbor) {
                    reached.push(neighbor);
                    frontier.push_back((neighbor, depth + 1));
                }
            }
        }
        reached.sort();
        Ok(reached)
    }

    fn find_path(
        &self,
        from_entity_id: Uuid,
        to_entity_id: Uuid,
        universe_id: Uuid,
    ) -> WeftResult<Option<Vec<Uuid>>> {
        let inner = self.inner.lock().unwrap();
        if !inner.node_index.contains_key(&from_entity_id)
            || !inner.node_index.contains_key(&to_entity_id)
        {
            return Ok(None);
        }
        if from_entity_id == to_entity_id {
            return Ok(Some(vec![from_entity_id]));
        }

        // Breadth-first, so the first time we reach the target the path is
        // shortest by hop count.
        let mut predecessor: HashMap<Uuid, Uuid> = HashMap::new();
        let mut frontier = VecDeque::from([from_entity_id]);
        'search: while let Some(current) = frontier.pop_front() {
            for neighbor in Self::neighbors(&inner, current, universe_id) {
                if neighbor == from_entity_id || predecessor.contains_key(&neighbor) {
                    continue;
                }
                predecessor.insert(neighbor, current);
                if neighbor == to_entity_id {
                    break 'search;
                }
                frontier.push_back(neighbor);
            }
        }

        if !predecessor.contains_key(&to_entity_id) {
            return Ok(None);
        }
        let mut path = vec![to_entity_id];
        let mut current = to_entity_id;
        while let Some(prev) = predecessor.get(&current) {
            path.push(*prev);
            current = *prev;
        }
        path.reverse();
        Ok(Some(path))
    }

    fn set_embedding(&self, entity_id: Uuid, embedding: Vec<f32>) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let idx = Self::ensure_node(&mut inner, entity_id);
        inner.graph[idx].embedding = Some(embedding);
        Ok(())
    }

    fn similarity_search(
        &self,
        query: &[f32],
        universe_id: Uuid,
        limit: usize,
    ) -> WeftResult<Vec<(Uuid, f32)>> {
        let inner = self.inner.lock().unwrap();
        let mut scored: Vec<(Uuid, f32)> = inner
            .graph
            .node_weights()
            .filter(|node| node.universe_id == Some(universe_id))
            .filter_map(|node| {
                node.embedding
                    .as_ref()
                    .map(|embedding| (node.id, cosine_similarity(query, embedding)))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    fn create_memory(&self, memory: &NpcMemory) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.memories.insert(memory.id, memory.clone());
        inner
            .memories_by_npc
            .entry(memory.npc_id)
            .or_default()
            .push(memory.id);
        Ok(())
    }

    fn get_memories_for_npc(&self, npc_id: Uuid, limit: usize) -> WeftResult<Vec<NpcMemory>> {
        let inner = self.inner.lock().unwrap();
        let mut memories: Vec<NpcMemory> = inner
            .memories_by_npc
            .get(&npc_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.memories.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        memories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        memories.truncate(limit);
        Ok(memories)
    }

    fn get_memories_about_entity(
        &self,
        npc_id: Uuid,
        subject_id: Uuid,
        limit: usize,
    ) -> WeftResult<Vec<NpcMemory>> {
        let mut memories = self.get_memories_for_npc(npc_id, usize::MAX)?;
        memories.retain(|memory| memory.subject_id == Some(subject_id));
        memories.truncate(limit);
        Ok(memories)
    }

    fn update_memory_recall(&self, memory_id: Uuid) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(memory) = inner.memories.get_mut(&memory_id) {
            memory.times_recalled += 1;
            memory.last_recalled = Some(chrono::Utc::now());
        }
        Ok(())
    }

    fn delete_memory(&self, memory_id: Uuid) -> WeftResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(memory) = inner.memories.remove(&memory_id) {
            if let Some(ids) = inner.memories_by_npc.get_mut(&memory.npc_id) {
                ids.retain(|id| *id != memory_id);
            }
        }
        Ok(())
    }
}
