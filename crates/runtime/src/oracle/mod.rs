//! Metadata oracle implementations.
//!
//! Static spell, aura and item data is immutable during a run; simulation
//! state lives in the [`crate::store::StateStore`].
mod memory;

pub use memory::InMemoryMetadata;
