#![forbid(unsafe_code)]

//! Runtime: the interactive planner session and saved designs.
//!
//! - [`session::PlannerSession`] ties quantities, the item sequence, the
//!   auto-pack policy, and layout recomputation together.
//! - [`design::DesignRecord`] is the persisted shape of a named design.
//! - [`design_store::DesignStore`] caches designs over a pluggable
//!   [`design_store::DesignBackend`].

pub mod design;
pub mod design_store;
pub mod session;

pub use design::{DESIGN_SCHEMA_VERSION, DesignId, DesignIdAllocator, DesignRecord};
pub use design_store::{
    DesignBackend, DesignStore, FileBackend, MemoryBackend, StorageError, StorageResult,
};
pub use session::{PlannerSession, SessionError};
