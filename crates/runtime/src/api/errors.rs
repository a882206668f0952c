//! Unified error types surfaced by the runtime API.
//!
//! Wraps the core crate's state, cast and metadata errors and adds the
//! failures that only exist once events, handlers and modifiers are in play.
use std::time::Duration;

use combat_core::{
    CastError, ErrorSeverity, MetadataError, SimError, SpellId, StateError, Subevent, Timestamp,
};
use thiserror::Error;

use crate::modifiers::Phase;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Modifier(#[from] ModifierError),

    #[error("event {event_id} scheduled at {event_time}ms, before current time {current_time}ms")]
    ScheduleInPast {
        event_id: String,
        current_time: Timestamp,
        event_time: Timestamp,
    },

    #[error("event {0} is already scheduled")]
    DuplicateEvent(String),

    #[error("handler {handler} failed on {subevent}")]
    Handler {
        handler: String,
        subevent: Subevent,
        #[source]
        source: Box<RuntimeError>,
    },

    #[error("invalid metadata")]
    Data(#[from] serde_json::Error),

    #[error("simulation halted at {at}ms")]
    Halted {
        at: Timestamp,
        #[source]
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    /// True for modifier timeouts, looking through handler and halt wrappers.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Modifier(err) => matches!(err.reason, ModifierFailure::Timeout(_)),
            Self::Handler { source, .. } | Self::Halted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// True when a cast was refused, either by validation or by a `before_cast` modifier.
    pub fn is_cast_rejection(&self) -> bool {
        match self {
            Self::Cast(_) => true,
            Self::Modifier(err) => match &err.reason {
                ModifierFailure::Failed(source) => source.is_cast_rejection(),
                _ => false,
            },
            _ => false,
        }
    }

    /// The modifier failure behind this error, if any.
    pub fn modifier(&self) -> Option<&ModifierError> {
        match self {
            Self::Modifier(err) => Some(err),
            Self::Handler { source, .. } | Self::Halted { source, .. } => source.modifier(),
            _ => None,
        }
    }
}

impl SimError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::State(err) => err.severity(),
            Self::Cast(err) => err.severity(),
            Self::Metadata(err) => err.severity(),
            Self::Modifier(err) => match &err.reason {
                ModifierFailure::Timeout(_) => ErrorSeverity::Recoverable,
                ModifierFailure::Failed(source) => source.severity(),
                ModifierFailure::Aborted(_) => ErrorSeverity::Internal,
            },
            Self::ScheduleInPast { .. } | Self::DuplicateEvent(_) => ErrorSeverity::Internal,
            Self::Handler { source, .. } | Self::Halted { source, .. } => source.severity(),
            Self::Data(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::State(err) => err.error_code(),
            Self::Cast(err) => err.error_code(),
            Self::Metadata(err) => err.error_code(),
            Self::Modifier(err) if matches!(err.reason, ModifierFailure::Timeout(_)) => {
                "MODIFIER_TIMEOUT"
            }
            Self::Modifier(_) => "MODIFIER",
            Self::ScheduleInPast { .. } => "SCHEDULE_IN_PAST",
            Self::DuplicateEvent(_) => "DUPLICATE_EVENT",
            Self::Handler { .. } => "HANDLER",
            Self::Data(_) => "DATA_ERROR",
            Self::Halted { .. } => "HALTED",
        }
    }
}

/// A modifier phase failure, tagged with the modifier and phase that produced it.
#[derive(Debug, Error)]
#[error("modifier {modifier} failed during {phase} of spell {spell_id}: {reason}")]
pub struct ModifierError {
    pub modifier: String,
    pub spell_id: SpellId,
    pub phase: Phase,
    #[source]
    pub reason: ModifierFailure,
}

#[derive(Debug, Error)]
pub enum ModifierFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(Box<RuntimeError>),

    /// The modifier task panicked or was cancelled before it finished.
    #[error("task aborted: {0}")]
    Aborted(String),
}
