//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (`StateError`, `CastError`, `MetadataError`) live next
//! to the code that produces them. This module provides the shared severity
//! classification and the [`SimError`] trait they all implement.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller can try again later or pick another action
///   (spell on cooldown, GCD active)
/// - **Validation**: the request referenced something that does not exist
/// - **Internal**: unexpected state inconsistency that needs investigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition; retrying at a later simulated time may succeed.
    Recoverable,

    /// Invalid input; retrying without changes will fail again.
    Validation,

    /// Unexpected state inconsistency.
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Return a stable, tag-like `error_code` so logs and tests can match on it
pub trait SimError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}
