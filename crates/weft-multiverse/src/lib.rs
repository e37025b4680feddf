//! weft-multiverse - Orchestration layer for the weft multiverse.
//!
//! [`MultiverseService`] ties the branch-partitioned world store and the
//! relationship graph together: forking timelines, moving characters
//! across worlds, archiving dead timelines, and answering lineage queries.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use weft_multiverse::MultiverseService;
//! use weft_world_stores::ArenaWorldStore;
//! use weft_graph_stores::EmbeddedGraphStore;
//!
//! let service = MultiverseService::new(
//!     Arc::new(ArenaWorldStore::new()),
//!     Arc::new(EmbeddedGraphStore::new()),
//! );
//! let prime = service.initialize_prime(None)?;
//! let fork = service.fork_universe(prime.id, "What If", "the king lived", None, None)?;
//! ```

pub mod results;
pub mod service;

pub use results::{ForkResult, TravelResult};
pub use service::MultiverseService;
