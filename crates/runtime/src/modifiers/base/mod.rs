//! Modifiers every spell gets unless its pipeline is overridden.
mod caster_state;
mod projectile;
mod resource;

pub use caster_state::CasterStateModifier;
pub use projectile::ProjectileModifier;
pub use resource::ResourceModifier;
