//! weft-world-stores - World store implementations for weft.
//!
//! Two backends for the branch-partitioned world store:
//!
//! - [`ArenaWorldStore`]: in-memory, `Arc`-sharing snapshot forks. The
//!   default for tests and single-session play.
//! - [`SqliteWorldStore`]: durable SQLite storage with branch-tagged rows
//!   and transactional branch creation.
//!
//! Both implement `weft_core::WorldStore` and are interchangeable behind
//! the orchestration layer.

pub mod arena;
pub mod sqlite;

pub use arena::{ArenaWorldStore, DEFAULT_ROOT_BRANCH};
pub use sqlite::SqliteWorldStore;
