//! Document/search store used as both system of record and similarity substrate.
//!
//! Repositories in the engine talk to a [`DocumentStore`]; the in-memory
//! implementation backs tests and single-process deployments, the Marqo client
//! backs shared deployments.

pub mod api;
pub mod errors;
pub mod marqo;
pub mod memory;
pub mod model;
pub mod similarity;

pub use api::DocumentStore;
pub use errors::StoreError;
pub use marqo::{MarqoConfig, MarqoDocumentStore};
pub use memory::MemoryDocumentStore;
pub use model::{Document, FieldFilter, SearchHit, SearchQuery};

/// Collection holding blocks.
pub const BLOCKS: &str = "automation-blocks";
/// Collection holding actions.
pub const ACTIONS: &str = "automation-actions";
/// Collection holding flows.
pub const FLOWS: &str = "automation-flows";
/// Collection holding flow executions.
pub const EXECUTIONS: &str = "automation-executions";

/// Every collection the engine expects to exist.
pub const ALL_COLLECTIONS: [&str; 4] = [BLOCKS, ACTIONS, FLOWS, EXECUTIONS];
