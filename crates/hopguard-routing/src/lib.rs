//! Hopguard routing: route confidence scoring and failure exclusion.
//!
//! This crate provides:
//! - [`ConfidenceAggregator`]: success probability of a multi-hop route, from
//!   live per-hop queries or the [`ReputationSnapshot`].
//! - [`ExclusionMapper`]: turns a [`FailureReport`] into [`ExclusionDirective`]s
//!   using a configurable [`ExclusionRules`] table.
//! - [`ExclusionSet`]: directives accumulated across attempts.
//! - [`PaymentRetryLoop`]: discover, attempt, exclude, repeat.
//! - Collaborator traits in [`traits`] and in-memory implementations in [`adapters`].

pub mod adapters;
pub mod confidence;
pub mod error;
pub mod exclusion;
pub mod exclusion_set;
pub mod reputation;
pub mod retry;
pub mod route;
pub mod traits;

// Re-exports for convenience.
pub use adapters::{InMemoryBackend, InMemoryNetwork, ScriptedFailure};
pub use confidence::{ConfidenceAggregator, ConfidenceResult};
pub use error::{CollaboratorError, ErrorKind, RoutingError};
pub use exclusion::{
    derive_exclusions, AttemptedHop, ExclusionDirective, ExclusionMapper, ExclusionRules,
    Exclusions, FailureReport,
};
pub use exclusion_set::ExclusionSet;
pub use reputation::{
    ChannelReputation, EdgeConfidence, NodeReputation, PeerReputation, ReputationSnapshot,
    Resolution,
};
pub use retry::{AttemptRecord, AttemptStatus, PaymentOutcome, PaymentRetryLoop, RouteScoring};
pub use route::{checked_hops, forwarding_edges, ForwardingEdge, Hop, Route, RouteHop};
pub use traits::{
    AttemptOutcome, HopConfidenceSource, HopQueryOutcome, LocalIdentity, PaymentExecutor,
    PaymentSuccess, ReputationSource, RouteDiscovery, RouteRequest,
};
