use thiserror::Error;

use crate::api::ApiError;
use crate::codec::CodecError;
use crate::model::ResourceKind;

/// Failures surfaced by list and edit screens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("malformed {kind} identifier: {source}")]
    MalformedIdentifier {
        kind: ResourceKind,
        #[source]
        source: CodecError,
    },
    #[error("failed to fetch {kind} data: {source}")]
    FetchFailure {
        kind: ResourceKind,
        #[source]
        source: ApiError,
    },
    #[error("{kind} update rejected: {message}")]
    SubmitConflict { kind: ResourceKind, message: String },
    #[error("failed to update {kind}: {source}")]
    SubmitTransportFailure {
        kind: ResourceKind,
        #[source]
        source: ApiError,
    },
}

impl ConsoleError {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ConsoleError::MalformedIdentifier { kind, .. }
            | ConsoleError::FetchFailure { kind, .. }
            | ConsoleError::SubmitConflict { kind, .. }
            | ConsoleError::SubmitTransportFailure { kind, .. } => *kind,
        }
    }

    /// Short notice shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::MalformedIdentifier { kind, .. } => format!("Invalid {kind} link."),
            ConsoleError::FetchFailure { kind, .. } => format!("Failed to fetch {kind} data."),
            ConsoleError::SubmitConflict { message, .. } => message.clone(),
            ConsoleError::SubmitTransportFailure { kind, .. } => format!("Failed to update {kind}."),
        }
    }
}
