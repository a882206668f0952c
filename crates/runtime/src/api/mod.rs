//! Public runtime API surface.
//!
//! Error types and the rotation abstraction live here so the scheduler, bus
//! and pipeline modules can stay focused on orchestration.

pub mod errors;
pub mod rotation;

pub use errors::{ModifierError, ModifierFailure, Result, RuntimeError};
pub use rotation::{IdleRotation, RotationAction, RotationProvider};
