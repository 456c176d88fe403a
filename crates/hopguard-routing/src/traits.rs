use async_trait::async_trait;
use hopguard_core::{Confidence, Millitokens, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::exclusion::FailureReport;
use crate::exclusion_set::ExclusionSet;
use crate::reputation::ReputationSnapshot;
use crate::route::{ForwardingEdge, Route};

/// Result of asking a collaborator for one hop's success probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopQueryOutcome {
    Supported(Confidence),
    /// The collaborator has no live per-hop query. Triggers the reputation fallback.
    Unsupported,
    Failed(CollaboratorError),
}

/// Source of historical forwarding reputation.
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Return every record the store holds. Matching happens client-side.
    async fn forwarding_reputations(&self) -> Result<ReputationSnapshot, CollaboratorError>;
}

/// Optional live per-hop confidence query.
#[async_trait]
pub trait HopConfidenceSource: Send + Sync {
    async fn hop_confidence(&self, _edge: &ForwardingEdge) -> HopQueryOutcome {
        HopQueryOutcome::Unsupported
    }
}

/// Identity of the node running the engine.
#[async_trait]
pub trait LocalIdentity: Send + Sync {
    async fn local_node(&self) -> Result<NodeId, CollaboratorError>;
}

/// A request for candidate routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub mtokens: Millitokens,
}

/// External pathfinding.
#[async_trait]
pub trait RouteDiscovery: Send + Sync {
    /// Candidate routes honouring `exclusions`, best first.
    async fn find_routes(
        &self,
        request: &RouteRequest,
        exclusions: &ExclusionSet,
    ) -> Result<Vec<Route>, CollaboratorError>;
}

/// Proof of a settled payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSuccess {
    /// Preimage revealed by the destination, hex encoded.
    pub secret: String,
    pub fee_mtokens: Millitokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Settled(PaymentSuccess),
    Failed(FailureReport),
}

/// Sends one payment attempt along a route.
#[async_trait]
pub trait PaymentExecutor: Send + Sync {
    async fn attempt(&self, route: &Route) -> Result<AttemptOutcome, CollaboratorError>;
}
