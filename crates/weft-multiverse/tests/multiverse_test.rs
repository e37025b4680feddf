//! Integration tests for the multiverse orchestration service.
//!
//! Exercises fork, travel, archive, and lineage end to end over the real
//! store implementations.

use std::sync::Arc;

use uuid::Uuid;
use weft_core::{
    Entity, EntityType, EventType, GraphStore, UniverseStatus, WorldStore,
};
use weft_graph_stores::EmbeddedGraphStore;
use weft_multiverse::MultiverseService;
use weft_world_stores::{ArenaWorldStore, SqliteWorldStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    service: MultiverseService,
    world: Arc<ArenaWorldStore>,
    graph: Arc<EmbeddedGraphStore>,
}

fn fixture() -> Fixture {
    init_tracing();
    let world = Arc::new(ArenaWorldStore::new());
    let graph = Arc::new(EmbeddedGraphStore::new());
    let service = MultiverseService::new(world.clone(), graph.clone());
    Fixture {
        service,
        world,
        graph,
    }
}

#[test]
fn test_initialize_prime_is_one_time() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    assert_eq!(prime.name, "Prime Material");
    assert!(prime.is_prime());
    assert_eq!(prime.branch_id, "main");

    let err = f.service.initialize_prime(Some("Again")).unwrap_err();
    assert!(err.to_string().contains("already hosts a universe"));
}

#[test]
fn test_fork_end_to_end() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();

    let result = f
        .service
        .fork_universe(prime.id, "Fork A", "testing", None, None)
        .unwrap();
    assert!(result.success, "fork failed: {:?}", result.error);

    let child = result.universe.unwrap();
    assert_eq!(child.depth, 1);
    assert_eq!(child.parent_id, Some(prime.id));
    assert_eq!(child.fork_reason.as_deref(), Some("testing"));
    assert!(child.branch_id.starts_with("fork/"));
    assert!(f.world.branch_exists(&child.branch_id).unwrap());

    // The FORK event lives on the child's branch with the reason in its
    // payload.
    let events = f.world.get_events(child.id).unwrap();
    let fork_events: Vec<_> = events
        .iter()
        .filter(|e| e.event_type == EventType::Fork)
        .collect();
    assert_eq!(fork_events.len(), 1);
    assert_eq!(fork_events[0].payload["fork_reason"], "testing");
    assert_eq!(
        fork_events[0].payload["parent_universe_id"],
        serde_json::json!(prime.id)
    );

    // Parent's branch is untouched.
    assert!(f.world.get_events(prime.id).unwrap().is_empty());

    let children = f.service.get_fork_children(prime.id).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);
}

#[test]
fn test_fork_branch_name_carries_owner() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let owner = Uuid::new_v4();

    let result = f
        .service
        .fork_universe(prime.id, "Mine", "ownership", Some(owner), None)
        .unwrap();
    let child = result.universe.unwrap();
    assert!(child.branch_id.starts_with(&format!("user/{owner}/")));
    assert_eq!(child.owner_id, Some(owner));
    // The FORK event's actor is the owner.
    assert_eq!(result.event.unwrap().actor_id, owner);
}

#[test]
fn test_fork_from_missing_parent_fails() {
    let f = fixture();
    f.service.initialize_prime(None).unwrap();

    let result = f
        .service
        .fork_universe(Uuid::new_v4(), "Nowhere", "no parent", None, None)
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not found"));
}

#[test]
fn test_fork_from_archived_parent_fails() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let child = f
        .service
        .fork_universe(prime.id, "Doomed", "to be archived", None, None)
        .unwrap()
        .universe
        .unwrap();
    assert!(f.service.archive_universe(child.id).unwrap());

    let result = f
        .service
        .fork_universe(child.id, "Too Late", "from the grave", None, None)
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("inactive"));
}

#[test]
fn test_fork_isolation() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();

    let mut hero = Entity::new(prime.id, EntityType::Character, "Hero");
    hero.attributes = serde_json::json!({"hp": 50});
    f.world.save_entity(&hero, prime.id).unwrap();

    let child = f
        .service
        .fork_universe(prime.id, "Fork A", "testing", None, None)
        .unwrap()
        .universe
        .unwrap();

    // Mutate the snapshot copy on the child only.
    let mut wounded = f.world.get_entity(hero.id, child.id).unwrap().unwrap();
    wounded.attributes = serde_json::json!({"hp": 1});
    f.world.save_entity(&wounded, child.id).unwrap();

    let on_prime = f.world.get_entity(hero.id, prime.id).unwrap().unwrap();
    assert_eq!(on_prime.attributes["hp"], 50);
    let on_child = f.world.get_entity(hero.id, child.id).unwrap().unwrap();
    assert_eq!(on_child.attributes["hp"], 1);
}

#[test]
fn test_archive_semantics() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let child = f
        .service
        .fork_universe(prime.id, "Short-lived", "testing", None, None)
        .unwrap()
        .universe
        .unwrap();

    // Prime is never archived; unknown ids are a soft false.
    assert!(!f.service.archive_universe(prime.id).unwrap());
    assert!(!f.service.archive_universe(Uuid::new_v4()).unwrap());
    assert_eq!(
        f.world.get_universe(prime.id).unwrap().unwrap().status,
        UniverseStatus::Active
    );

    assert!(f.service.archive_universe(child.id).unwrap());
    let archived = f.world.get_universe(child.id).unwrap().unwrap();
    assert_eq!(archived.status, UniverseStatus::Archived);
    assert!(archived.updated_at >= archived.created_at);

    // Archived universes remain fully readable.
    assert!(!f.world.get_events(child.id).unwrap().is_empty());
}

#[test]
fn test_lineage_root_first() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();

    let prime_lineage = f.service.get_universe_lineage(prime.id).unwrap();
    assert_eq!(prime_lineage.len(), 1);
    assert_eq!(prime_lineage[0].id, prime.id);

    let child = f
        .service
        .fork_universe(prime.id, "Child", "first", None, None)
        .unwrap()
        .universe
        .unwrap();
    let grandchild = f
        .service
        .fork_universe(child.id, "Grandchild", "second", None, None)
        .unwrap()
        .universe
        .unwrap();
    assert_eq!(grandchild.depth, 2);

    let lineage = f.service.get_universe_lineage(grandchild.id).unwrap();
    assert_eq!(lineage.len(), 3);
    assert_eq!(lineage[0].id, prime.id);
    assert_eq!(lineage[1].id, child.id);
    assert_eq!(lineage[2].id, grandchild.id);

    assert!(f
        .service
        .get_universe_lineage(Uuid::new_v4())
        .unwrap()
        .is_empty());
}

#[test]
fn test_travel_end_to_end() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();

    let hero = Entity::new(prime.id, EntityType::Character, "Hero");
    f.world.save_entity(&hero, prime.id).unwrap();
    f.graph
        .register_entity(hero.id, "Hero", EntityType::Character, Some(prime.id))
        .unwrap();

    let destination = f
        .service
        .fork_universe(prime.id, "Destination", "travel test", None, None)
        .unwrap()
        .universe
        .unwrap();

    let result = f
        .service
        .travel_between_worlds(hero.id, prime.id, destination.id, Some("rift"))
        .unwrap();
    assert!(result.success, "travel failed: {:?}", result.error);
    let copy_id = result.traveler_copy_id.unwrap();
    assert_ne!(copy_id, hero.id);

    // The copy lives in the destination with a fresh identity.
    let copy = f.world.get_entity(copy_id, destination.id).unwrap().unwrap();
    assert_eq!(copy.name, "Hero");
    assert_eq!(copy.universe_id, destination.id);
    assert!(copy.current_location_id.is_none());

    // The original is unchanged in the source universe.
    let original = f.world.get_entity(hero.id, prime.id).unwrap().unwrap();
    assert_eq!(original.universe_id, prime.id);
    assert_eq!(original.updated_at, hero.updated_at);

    // Variant link and destination-side resolution.
    assert!(f.graph.has_variant(hero.id, destination.id).unwrap());
    assert_eq!(
        f.graph
            .get_entity_in_universe("Hero", destination.id, Some(EntityType::Character))
            .unwrap(),
        Some(copy_id)
    );

    // The TRAVEL event is on the destination's branch, last in the log.
    let events = f.world.get_events(destination.id).unwrap();
    let travel = events.last().unwrap();
    assert_eq!(travel.event_type, EventType::Travel);
    assert_eq!(travel.actor_id, copy_id);
    assert_eq!(travel.payload["travel_method"], "rift");
    assert_eq!(
        travel.payload["original_entity_id"],
        serde_json::json!(hero.id)
    );
}

#[test]
fn test_travel_uses_default_method() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let hero = Entity::new(prime.id, EntityType::Character, "Hero");
    f.world.save_entity(&hero, prime.id).unwrap();
    let destination = f
        .service
        .fork_universe(prime.id, "Destination", "travel test", None, None)
        .unwrap()
        .universe
        .unwrap();

    let result = f
        .service
        .travel_between_worlds(hero.id, prime.id, destination.id, None)
        .unwrap();
    assert!(result.success);
    assert_eq!(result.event.unwrap().payload["travel_method"], "portal");
}

#[test]
fn test_travel_rejects_non_characters() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let tavern = Entity::new(prime.id, EntityType::Location, "Tavern");
    f.world.save_entity(&tavern, prime.id).unwrap();

    let destination = f
        .service
        .fork_universe(prime.id, "Destination", "travel test", None, None)
        .unwrap()
        .universe
        .unwrap();

    let result = f
        .service
        .travel_between_worlds(tavern.id, prime.id, destination.id, None)
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("only characters may travel"));

    // Neither a copy nor a variant link was created: the destination holds
    // only the snapshot copy of the tavern, under its original id.
    let locations = f
        .world
        .get_entities_by_type(EntityType::Location, destination.id)
        .unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].id, tavern.id);
    assert!(!f.graph.has_variant(tavern.id, destination.id).unwrap());
    // No TRAVEL event either.
    assert!(f
        .world
        .get_events(destination.id)
        .unwrap()
        .iter()
        .all(|e| e.event_type != EventType::Travel));
}

#[test]
fn test_travel_failures_name_the_missing_piece() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let destination = f
        .service
        .fork_universe(prime.id, "Destination", "travel test", None, None)
        .unwrap()
        .universe
        .unwrap();

    let result = f
        .service
        .travel_between_worlds(Uuid::new_v4(), prime.id, destination.id, None)
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("traveler"));

    let result = f
        .service
        .travel_between_worlds(Uuid::new_v4(), Uuid::new_v4(), destination.id, None)
        .unwrap();
    assert!(result.error.unwrap().contains("source universe"));

    let result = f
        .service
        .travel_between_worlds(Uuid::new_v4(), prime.id, Uuid::new_v4(), None)
        .unwrap();
    assert!(result.error.unwrap().contains("destination universe"));
}

#[test]
fn test_travel_twice_to_same_universe_fails() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();
    let hero = Entity::new(prime.id, EntityType::Character, "Hero");
    f.world.save_entity(&hero, prime.id).unwrap();
    let destination = f
        .service
        .fork_universe(prime.id, "Destination", "travel test", None, None)
        .unwrap()
        .universe
        .unwrap();

    let first = f
        .service
        .travel_between_worlds(hero.id, prime.id, destination.id, None)
        .unwrap();
    assert!(first.success);

    // At most one live variant per (original, destination universe).
    let second = f
        .service
        .travel_between_worlds(hero.id, prime.id, destination.id, None)
        .unwrap();
    assert!(!second.success);
    assert!(second.error.unwrap().contains("already has a variant"));
}

#[test]
fn test_resolution_precedence_via_travel() {
    let f = fixture();
    let prime = f.service.initialize_prime(None).unwrap();

    // "King" is canon: registered with no universe binding.
    let king = Entity::new(prime.id, EntityType::Character, "King");
    f.world.save_entity(&king, prime.id).unwrap();
    f.graph
        .register_entity(king.id, "King", EntityType::Character, None)
        .unwrap();

    let v = f
        .service
        .fork_universe(prime.id, "V", "variant test", None, None)
        .unwrap()
        .universe
        .unwrap();
    let untouched = f
        .service
        .fork_universe(prime.id, "Untouched", "no variant here", None, None)
        .unwrap()
        .universe
        .unwrap();

    let copy_id = f
        .service
        .travel_between_worlds(king.id, prime.id, v.id, None)
        .unwrap()
        .traveler_copy_id
        .unwrap();

    // In V the variant wins over canon; elsewhere canon still resolves.
    assert_eq!(
        f.graph.get_entity_in_universe("King", v.id, None).unwrap(),
        Some(copy_id)
    );
    assert_eq!(
        f.graph
            .get_entity_in_universe("King", untouched.id, None)
            .unwrap(),
        Some(king.id)
    );
}

#[test]
fn test_fork_end_to_end_on_sqlite() {
    init_tracing();
    let world = Arc::new(SqliteWorldStore::in_memory().unwrap());
    let graph = Arc::new(EmbeddedGraphStore::new());
    let service = MultiverseService::new(world.clone(), graph);

    let prime = service.initialize_prime(Some("Prime Material")).unwrap();
    let hero = Entity::new(prime.id, EntityType::Character, "Hero");
    world.save_entity(&hero, prime.id).unwrap();

    let fork = service
        .fork_universe(prime.id, "Fork A", "testing", None, None)
        .unwrap();
    assert!(fork.success);
    let child = fork.universe.unwrap();

    let travel = service
        .travel_between_worlds(hero.id, prime.id, child.id, None)
        .unwrap();
    assert!(travel.success, "travel failed: {:?}", travel.error);

    let events = world.get_events(child.id).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::Fork);
    assert_eq!(events[1].event_type, EventType::Travel);
}
