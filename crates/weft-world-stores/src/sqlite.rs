//! SQLite-backed world store.
//!
//! Branch partitioning is modeled directly in the schema: every record row
//! carries a `branch` column, and creating a branch copies the source
//! branch's rows inside one transaction. Records are stored as JSON
//! documents next to the few columns needed for indexing, so the row
//! format does not chase the record types.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use weft_core::error::{WeftError, WeftResult};
use weft_core::traits::WorldStore;
use weft_core::types::{Entity, EntityType, Event, Universe};

use crate::arena::DEFAULT_ROOT_BRANCH;

/// SQLite-backed branch-partitioned world store.
pub struct SqliteWorldStore {
    conn: Mutex<Connection>,
    root_branch: String,
}

impl SqliteWorldStore {
    /// Open (or create) a store at the given path with the default `main`
    /// root branch.
    pub fn new(path: impl AsRef<Path>) -> WeftResult<Self> {
        Self::with_root_branch(path, DEFAULT_ROOT_BRANCH)
    }

    /// Open (or create) a store at the given path with a custom root
    /// branch name.
    pub fn with_root_branch(path: impl AsRef<Path>, root_branch: &str) -> WeftResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, root_branch)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> WeftResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, DEFAULT_ROOT_BRANCH)
    }

    fn init(conn: Connection, root_branch: &str) -> WeftResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            root_branch: root_branch.to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> WeftResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS branches (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS universes (
                branch TEXT NOT NULL,
                id TEXT NOT NULL,
                branch_id TEXT NOT NULL,
                parent_id TEXT,
                data TEXT NOT NULL,
                PRIMARY KEY (branch, id)
            );

            -- Fork-children index: home-branch rows only are consulted,
            -- filtered by branch = branch_id at query time.
            CREATE INDEX IF NOT EXISTS idx_universes_parent
                ON universes(parent_id);

            CREATE TABLE IF NOT EXISTS entities (
                branch TEXT NOT NULL,
                id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (branch, id)
            );

            CREATE INDEX IF NOT EXISTS idx_entities_type
                ON entities(branch, entity_type);

            -- seq breaks timestamp ties in insertion order.
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                branch TEXT NOT NULL,
                id TEXT NOT NULL,
                universe_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_branch_time
                ON events(branch, timestamp, seq);
        "#,
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO branches (name) VALUES (?1)",
            params![self.root_branch],
        )?;
        Ok(())
    }

    /// Home branch of a universe, resolved through its authoritative row
    /// (the one living on its own branch).
    fn home_branch(conn: &Connection, universe_id: Uuid) -> WeftResult<Option<String>> {
        let branch: Option<String> = conn
            .query_row(
                "SELECT branch_id FROM universes WHERE id = ?1 AND branch = branch_id",
                params![universe_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(branch)
    }

    fn branch_exists_inner(conn: &Connection, name: &str) -> WeftResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM branches WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl WorldStore for SqliteWorldStore {
    fn root_branch(&self) -> &str {
        &self.root_branch
    }

    fn create_branch(&self, name: &str, from_branch: &str) -> WeftResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if Self::branch_exists_inner(&tx, name)? {
            return Err(WeftError::branch(format!("branch '{name}' already exists")));
        }
        if !Self::branch_exists_inner(&tx, from_branch)? {
            return Err(WeftError::branch(format!(
                "branch '{from_branch}' does not exist"
            )));
        }

        tx.execute("INSERT INTO branches (name) VALUES (?1)", params![name])?;
        tx.execute(
            r#"INSERT INTO universes (branch, id, branch_id, parent_id, data)
               SELECT ?1, id, branch_id, parent_id, data FROM universes WHERE branch = ?2"#,
            params![name, from_branch],
        )?;
        tx.execute(
            r#"INSERT INTO entities (branch, id, entity_type, data)
               SELECT ?1, id, entity_type, data FROM entities WHERE branch = ?2"#,
            params![name, from_branch],
        )?;
        // ORDER BY seq so the copies keep the source insertion order.
        tx.execute(
            r#"INSERT INTO events (branch, id, universe_id, timestamp, data)
               SELECT ?1, id, universe_id, timestamp, data FROM events
               WHERE branch = ?2 ORDER BY seq"#,
            params![name, from_branch],
        )?;

        tx.commit()?;
        tracing::debug!(branch = name, from = from_branch, "created branch");
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> WeftResult<()> {
        let mut conn = self.conn.lock().unwrap();
        if name == self.root_branch {
            return Err(WeftError::invalid_operation(format!(
                "cannot delete the root branch '{name}'"
            )));
        }

        let tx = conn.transaction()?;
        let bound: i64 = tx.query_row(
            "SELECT COUNT(*) FROM universes WHERE branch_id = ?1 AND branch = branch_id",
            params![name],
            |row| row.get(0),
        )?;
        if bound > 0 {
            return Err(WeftError::invalid_operation(format!(
                "branch '{name}' is the home branch of a universe"
            )));
        }
        let removed = tx.execute("DELETE FROM branches WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(WeftError::branch(format!("branch '{name}' does not exist")));
        }
        tx.execute("DELETE FROM universes WHERE branch = ?1", params![name])?;
        tx.execute("DELETE FROM entities WHERE branch = ?1", params![name])?;
        tx.execute("DELETE FROM events WHERE branch = ?1", params![name])?;
        tx.commit()?;
        tracing::debug!(branch = name, "deleted branch");
        Ok(())
    }

    fn branch_exists(&self, name: &str) -> WeftResult<bool> {
        let conn = self.conn.lock().unwrap();
        Self::branch_exists_inner(&conn, name)
    }

    fn list_branches(&self) -> WeftResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT name FROM branches")?;
        let names = stmt.query_map([], |row| row.get(0))?;
        names.collect::<Result<Vec<String>, _>>().map_err(Into::into)
    }

    fn save_universe(&self, universe: &Universe) -> WeftResult<()> {
        let conn = self.conn.lock().unwrap();
        if !Self::branch_exists_inner(&conn, &universe.branch_id)? {
            return Err(WeftError::branch(format!(
                "home branch '{}' of universe '{}' does not exist",
                universe.branch_id, universe.name
            )));
        }
        conn.execute(
            r#"INSERT OR REPLACE INTO universes (branch, id, branch_id, parent_id, data)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                universe.branch_id,
                universe.id.to_string(),
                universe.branch_id,
                universe.parent_id.map(|id| id.to_string()),
                serde_json::to_string(universe)?,
            ],
        )?;
        Ok(())
    }

    fn get_universe(&self, id: Uuid) -> WeftResult<Option<Universe>> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM universes WHERE id = ?1 AND branch = branch_id",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d)).transpose().map_err(Into::into)
    }

    fn get_universe_by_branch(&self, branch: &str) -> WeftResult<Option<Universe>> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM universes WHERE branch_id = ?1 AND branch = branch_id",
                params![branch],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d)).transpose().map_err(Into::into)
    }

    fn get_universes_by_parent(&self, parent_id: Uuid) -> WeftResult<Vec<Universe>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT data FROM universes WHERE parent_id = ?1 AND branch = branch_id",
        )?;
        let rows = stmt.query_map(params![parent_id.to_string()], |row| {
            row.get::<_, String>(0)
        })?;
        let mut children = Vec::new();
        for row in rows {
            children.push(serde_json::from_str::<Universe>(&row?)?);
        }
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    fn save_entity(&self, entity: &Entity, universe_id: Uuid) -> WeftResult<()> {
        let conn = self.conn.lock().unwrap();
        let branch = Self::home_branch(&conn, universe_id)?
            .ok_or_else(|| WeftError::not_found(format!("universe {universe_id} not found")))?;
        conn.execute(
            r#"INSERT OR REPLACE INTO entities (branch, id, entity_type, data)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                branch,
                entity.id.to_string(),
                entity.entity_type.to_string(),
                serde_json::to_string(entity)?,
            ],
        )?;
        Ok(())
    }

    fn get_entity(&self, id: Uuid, universe_id: Uuid) -> WeftResult<Option<Entity>> {
        let conn = self.conn.lock().unwrap();
        let branch = match Self::home_branch(&conn, universe_id)? {
            Some(branch) => branch,
            None => return Ok(None),
        };
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM entities WHERE branch = ?1 AND id = ?2",
                params![branch, id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d)).transpose().map_err(Into::into)
    }

    fn get_entities_by_type(
        &self,
        entity_type: EntityType,
        universe_id: Uuid,
    ) -> WeftResult<Vec<Entity>> {
        let conn = self.conn.lock().unwrap();
        let branch = match Self::home_branch(&conn, universe_id)? {
            Some(branch) => branch,
            None => return Ok(Vec::new()),
        };
        let mut stmt = conn
            .prepare("SELECT data FROM entities WHERE branch = ?1 AND entity_type = ?2")?;
        let rows = stmt.query_map(params![branch, entity_type.to_string()], |row| {
            row.get::<_, String>(0)
        })?;
        let mut entities = Vec::new();
        for row in rows {
            entities.push(serde_json::from_str::<Entity>(&row?)?);
        }
        Ok(entities)
    }

    fn append_event(&self, event: &Event) -> WeftResult<()> {
        let conn = self.conn.lock().unwrap();
        let branch = Self::home_branch(&conn, event.universe_id)?.ok_or_else(|| {
            WeftError::not_found(format!("universe {} not found", event.universe_id))
        })?;
        conn.execute(
            r#"INSERT INTO events (branch, id, universe_id, timestamp, data)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                branch,
                event.id.to_string(),
                event.universe_id.to_string(),
                event.timestamp.to_rfc3339(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    fn get_events(&self, universe_id: Uuid) -> WeftResult<Vec<Event>> {
        let conn = self.conn.lock().unwrap();
        let branch = match Self::home_branch(&conn, universe_id)? {
            Some(branch) => branch,
            None => return Ok(Vec::new()),
        };
        let mut stmt = conn.prepare(
            "SELECT data FROM events WHERE branch = ?1 ORDER BY timestamp ASC, seq ASC",
        )?;
        let rows = stmt.query_map(params![branch], |row| row.get::<_, String>(0))?;
        let mut events = Vec::new();
        for row in rows {
            events.push(serde_json::from_str::<Event>(&row?)?);
        }
        Ok(events)
    }

    fn get_event(&self, id: Uuid) -> WeftResult<Option<Event>> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM events WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| serde_json::from_str(&d)).transpose().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use weft_core::types::{EventType, UniverseStatus};

    fn prime(store: &SqliteWorldStore) -> Universe {
        let universe = Universe::prime("Prime Material", store.root_branch());
        store.save_universe(&universe).unwrap();
        universe
    }

    fn fork_of(store: &SqliteWorldStore, parent: &Universe, branch: &str) -> Universe {
        store.create_branch(branch, &parent.branch_id).unwrap();
        let child = Universe::fork(parent, "Fork", branch, None, "testing", None);
        store.save_universe(&child).unwrap();
        child
    }

    #[test]
    fn test_root_branch_seeded_on_open() {
        let store = SqliteWorldStore::in_memory().unwrap();
        assert_eq!(store.root_branch(), "main");
        assert!(store.branch_exists("main").unwrap());
        assert_eq!(store.list_branches().unwrap(), vec!["main".to_string()]);
    }

    #[test]
    fn test_branch_creation_errors() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let err = store.create_branch("fork/a", "nope").unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        store.create_branch("fork/a", "main").unwrap();
        let err = store.create_branch("fork/a", "main").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_delete_branch_guards() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);
        let child = fork_of(&store, &p, "fork/a");

        let err = store.delete_branch("main").unwrap_err();
        assert!(err.to_string().contains("root branch"));

        let err = store.delete_branch(&child.branch_id).unwrap_err();
        assert!(err.to_string().contains("home branch"));

        store.create_branch("fork/scratch", "main").unwrap();
        store.delete_branch("fork/scratch").unwrap();
        assert!(!store.branch_exists("fork/scratch").unwrap());
    }

    #[test]
    fn test_universe_roundtrip() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);

        let by_id = store.get_universe(p.id).unwrap().unwrap();
        assert_eq!(by_id.name, "Prime Material");
        assert_eq!(by_id.status, UniverseStatus::Active);

        let by_branch = store.get_universe_by_branch("main").unwrap().unwrap();
        assert_eq!(by_branch.id, p.id);

        assert!(store.get_universe(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_universe_lookup_ignores_stale_snapshot_copies() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let mut p = prime(&store);
        let _child = fork_of(&store, &p, "fork/a");

        p.status = UniverseStatus::Archived;
        store.save_universe(&p).unwrap();

        // The fork branch still carries the pre-fork copy of Prime's row,
        // but the authoritative lookup only sees the home-branch row.
        let current = store.get_universe(p.id).unwrap().unwrap();
        assert_eq!(current.status, UniverseStatus::Archived);
    }

    #[test]
    fn test_fork_children_index() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);
        let a = fork_of(&store, &p, "fork/a");
        let b = fork_of(&store, &p, "fork/b");
        let _grandchild = fork_of(&store, &a, "fork/a2");

        let children = store.get_universes_by_parent(p.id).unwrap();
        assert_eq!(children.len(), 2);
        let ids: Vec<Uuid> = children.iter().map(|u| u.id).collect();
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
    }

    #[test]
    fn test_fork_seeds_snapshot_and_isolates_writes() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);

        let mut hero = Entity::new(p.id, EntityType::Character, "Hero");
        hero.attributes = serde_json::json!({"hp": 50});
        store.save_entity(&hero, p.id).unwrap();

        let child = fork_of(&store, &p, "fork/a");

        let seeded = store.get_entity(hero.id, child.id).unwrap().unwrap();
        assert_eq!(seeded.attributes["hp"], 50);

        let mut wounded = seeded;
        wounded.attributes = serde_json::json!({"hp": 1});
        store.save_entity(&wounded, child.id).unwrap();

        assert_eq!(
            store.get_entity(hero.id, p.id).unwrap().unwrap().attributes["hp"],
            50
        );
        assert_eq!(
            store.get_entity(hero.id, child.id).unwrap().unwrap().attributes["hp"],
            1
        );
    }

    #[test]
    fn test_entities_by_type_scoped_to_partition() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);

        store
            .save_entity(&Entity::new(p.id, EntityType::Character, "Hero"), p.id)
            .unwrap();
        store
            .save_entity(&Entity::new(p.id, EntityType::Location, "Tavern"), p.id)
            .unwrap();

        let characters = store.get_entities_by_type(EntityType::Character, p.id).unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Hero");

        // Unknown universe reads come back empty, not as errors.
        let none = store
            .get_entities_by_type(EntityType::Character, Uuid::new_v4())
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_events_ordered_by_timestamp_then_insertion() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);
        let actor = Uuid::new_v4();

        let shared = Utc::now() - Duration::hours(1);
        let mut first = Event::new(p.id, EventType::Dialogue, actor);
        first.timestamp = shared;
        let mut second = Event::new(p.id, EventType::Combat, actor);
        second.timestamp = shared;
        let mut later = Event::new(p.id, EventType::Discovery, actor);
        later.timestamp = Utc::now();

        store.append_event(&later).unwrap();
        store.append_event(&first).unwrap();
        store.append_event(&second).unwrap();

        let events = store.get_events(p.id).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, first.id);
        assert_eq!(events[1].id, second.id);
        assert_eq!(events[2].id, later.id);
    }

    #[test]
    fn test_fork_inherits_event_log() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);
        let event = Event::new(p.id, EventType::Dialogue, Uuid::new_v4());
        store.append_event(&event).unwrap();

        let child = fork_of(&store, &p, "fork/a");
        let log = store.get_events(child.id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, event.id);

        let child_event = Event::new(child.id, EventType::Combat, Uuid::new_v4());
        store.append_event(&child_event).unwrap();
        assert_eq!(store.get_events(p.id).unwrap().len(), 1);
        assert_eq!(store.get_events(child.id).unwrap().len(), 2);
    }

    #[test]
    fn test_get_event_by_id() {
        let store = SqliteWorldStore::in_memory().unwrap();
        let p = prime(&store);
        let event = Event::new(p.id, EventType::System, Uuid::new_v4());
        store.append_event(&event).unwrap();

        assert!(store.get_event(event.id).unwrap().is_some());
        assert!(store.get_event(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.db");

        let p = {
            let store = SqliteWorldStore::new(&path).unwrap();
            let p = prime(&store);
            store
                .save_entity(&Entity::new(p.id, EntityType::Character, "Hero"), p.id)
                .unwrap();
            p
        };

        let reopened = SqliteWorldStore::new(&path).unwrap();
        let universe = reopened.get_universe(p.id).unwrap().unwrap();
        assert_eq!(universe.name, "Prime Material");
        let heroes = reopened
            .get_entities_by_type(EntityType::Character, p.id)
            .unwrap();
        assert_eq!(heroes.len(), 1);
    }
}
