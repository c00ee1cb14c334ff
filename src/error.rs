//! Error taxonomy surfaced by the match engine.

use crate::shot::PlayerId;

/// Errors returned by match, round, log and recorder operations.
///
/// Controller timeouts and faults are deliberately absent: they never reach
/// the caller and are recorded as player events instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Operation is not valid in the current lifecycle phase.
    #[error("invalid state: {reason}")]
    State { reason: String },

    /// No player is registered under the given id.
    #[error("unknown player {player}")]
    Lookup { player: PlayerId },

    /// The configuration cannot drive a match.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// An event does not fit the state it was applied to.
    #[error("event #{index} is inconsistent with match state: {reason}")]
    Inconsistent { index: usize, reason: String },

    /// A recorder failed to store or load a match record.
    #[error("persistence error: {reason}")]
    Persistence {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    pub(crate) fn state(reason: impl Into<String>) -> Self {
        EngineError::State {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        EngineError::Persistence {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Reason a single controller call produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerFailure {
    /// The call did not return before the deadline.
    #[error("{method} timed out")]
    Timeout { method: &'static str },
    /// The call returned an error, panicked, or returned an unusable value.
    #[error("{method} failed: {reason}")]
    Fault { method: &'static str, reason: String },
}

impl ControllerFailure {
    /// Name of the controller call that failed.
    pub fn method(&self) -> &'static str {
        match self {
            ControllerFailure::Timeout { method } | ControllerFailure::Fault { method, .. } => {
                method
            }
        }
    }
}
