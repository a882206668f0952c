//! Pure value transforms that derive new entities from old ones.
//!
//! Entities never mutate themselves. Each entity hands out a transform seeded
//! with its current raw value and a constructor callback; every transform call
//! computes a new raw value and passes it, together with the call's timestamp,
//! to the constructor, which returns a brand-new entity.
//!
//! - [`Bounded`] covers stacks, charges and resource pools (clamped to `[min, max]`).
//! - [`Expiry`] covers cooldowns and durations (absolute expiry timestamps).
mod bounded;
mod expiry;

pub use bounded::Bounded;
pub use expiry::Expiry;
