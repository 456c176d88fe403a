use hopguard_core::{ChannelId, CoreError, FailureReason};

/// Opaque failure reported by an external collaborator (reputation store,
/// per-hop query, route discovery, payment executor). Carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Machine-checkable classification of a [`RoutingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, reported before any collaborator call.
    InvalidInput,
    /// A live per-hop confidence query failed or was cancelled.
    QueryFailed,
    /// Another collaborator call failed.
    Collaborator,
    /// A failure reason with no exclusion rule.
    UnrecognizedReason,
    /// The destination refused the payment.
    Rejected,
    /// The retry loop ran out of routes, attempts, or time.
    Exhausted,
}

/// Errors that can occur within the routing layer.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("invalid hop set: {reason}")]
    InvalidHopSet { reason: String },

    #[error("confidence query failed at hop {hop_index}: {message}")]
    ConfidenceQueryFailed { hop_index: usize, message: String },

    #[error("expected attempted hops to derive exclusions")]
    MissingHops,

    #[error("attempted hop {index} is missing a channel or destination node")]
    MalformedHops { index: usize },

    #[error("expected the public key of the reporting node")]
    MissingReportingNode,

    #[error("expected a failure reason")]
    MissingReason,

    #[error("unrecognized failure reason: {reason}")]
    UnrecognizedReason { reason: String },

    #[error("failing channel {channel} is not part of the attempted route")]
    FailingChannelNotInRoute { channel: ChannelId },

    #[error("failing channel {channel} appears more than once in the attempted route")]
    AmbiguousFailingChannel { channel: ChannelId },

    #[error("destination rejected the payment: {reason}")]
    DestinationRejected { reason: FailureReason },

    #[error("no admissible route left after {attempts} attempts")]
    RoutesExhausted { attempts: usize },

    #[error("maximum attempts exceeded: {max_attempts}")]
    AttemptsExhausted { max_attempts: u32 },

    #[error("failure on attempt {attempts} added no new exclusions")]
    NoProgress { attempts: usize },

    #[error("payment timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl RoutingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHopSet { .. }
            | Self::MissingHops
            | Self::MalformedHops { .. }
            | Self::MissingReportingNode
            | Self::MissingReason
            | Self::FailingChannelNotInRoute { .. }
            | Self::AmbiguousFailingChannel { .. }
            | Self::Core(_) => ErrorKind::InvalidInput,
            Self::ConfidenceQueryFailed { .. } => ErrorKind::QueryFailed,
            Self::Collaborator(_) => ErrorKind::Collaborator,
            Self::UnrecognizedReason { .. } => ErrorKind::UnrecognizedReason,
            Self::DestinationRejected { .. } => ErrorKind::Rejected,
            Self::RoutesExhausted { .. }
            | Self::AttemptsExhausted { .. }
            | Self::NoProgress { .. }
            | Self::Timeout { .. } => ErrorKind::Exhausted,
        }
    }
}
