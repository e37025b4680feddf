//! Store traits: the stable contracts between the stores and their
//! collaborators.

pub mod graph_store;
pub mod world_store;

pub use graph_store::GraphStore;
pub use world_store::WorldStore;
