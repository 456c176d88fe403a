use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use hopguard_core::{ChannelId, Confidence, FailureReason, Millitokens, NodeId};

use crate::error::CollaboratorError;
use crate::exclusion::FailureReport;
use crate::exclusion_set::ExclusionSet;
use crate::reputation::{NodeReputation, ReputationSnapshot};
use crate::route::{ForwardingEdge, Route};
use crate::traits::{
    AttemptOutcome, HopConfidenceSource, HopQueryOutcome, LocalIdentity, PaymentExecutor,
    PaymentSuccess, ReputationSource, RouteDiscovery, RouteRequest,
};

/// In-memory reputation store, local identity, and optional live hop query.
///
/// Live queries are unsupported until the first call to
/// [`InMemoryBackend::set_hop_confidence`]; after that, pairs without data
/// fail. Useful for tests and for offline scoring from a JSON dump.
pub struct InMemoryBackend {
    local: NodeId,
    reputations: DashMap<NodeId, NodeReputation>,
    live: DashMap<(NodeId, NodeId), Confidence>,
    reputation_queries: AtomicUsize,
    hop_queries: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new(local: NodeId) -> Self {
        Self {
            local,
            reputations: DashMap::new(),
            live: DashMap::new(),
            reputation_queries: AtomicUsize::new(0),
            hop_queries: AtomicUsize::new(0),
        }
    }

    /// Seed from a snapshot, e.g. one decoded from a file.
    pub fn with_snapshot(local: NodeId, snapshot: &ReputationSnapshot) -> Self {
        let backend = Self::new(local);
        for record in snapshot.records() {
            backend.put_reputation(record.clone());
        }
        backend
    }

    /// Insert or replace a node's record.
    pub fn put_reputation(&self, record: NodeReputation) {
        self.reputations.insert(record.node.clone(), record);
    }

    /// Record a live success probability for forwarding `from -> to`.
    pub fn set_hop_confidence(&self, from: NodeId, to: NodeId, confidence: Confidence) {
        self.live.insert((from, to), confidence);
    }

    pub fn reputation_queries(&self) -> usize {
        self.reputation_queries.load(Ordering::Relaxed)
    }

    pub fn hop_queries(&self) -> usize {
        self.hop_queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReputationSource for InMemoryBackend {
    async fn forwarding_reputations(&self) -> Result<ReputationSnapshot, CollaboratorError> {
        self.reputation_queries.fetch_add(1, Ordering::Relaxed);
        Ok(ReputationSnapshot::from_records(
            self.reputations.iter().map(|entry| entry.value().clone()),
        ))
    }
}

#[async_trait]
impl HopConfidenceSource for InMemoryBackend {
    async fn hop_confidence(&self, edge: &ForwardingEdge) -> HopQueryOutcome {
        if self.live.is_empty() {
            return HopQueryOutcome::Unsupported;
        }
        self.hop_queries.fetch_add(1, Ordering::Relaxed);

        let pair = (edge.from_node.clone(), edge.to_node.clone());
        match self.live.get(&pair) {
            Some(confidence) => HopQueryOutcome::Supported(*confidence),
            None => HopQueryOutcome::Failed(CollaboratorError::new(format!(
                "no live data for {} -> {}",
                edge.from_node.short(),
                edge.to_node.short()
            ))),
        }
    }
}

#[async_trait]
impl LocalIdentity for InMemoryBackend {
    async fn local_node(&self) -> Result<NodeId, CollaboratorError> {
        Ok(self.local.clone())
    }
}

/// How a scripted channel fails when a route crosses it.
#[derive(Debug, Clone)]
pub struct ScriptedFailure {
    pub reporting_node: NodeId,
    pub reason: FailureReason,
    /// Whether the report names the failing channel.
    pub report_channel: bool,
}

impl ScriptedFailure {
    pub fn at_channel(reporting_node: NodeId, reason: FailureReason) -> Self {
        Self {
            reporting_node,
            reason,
            report_channel: true,
        }
    }

    pub fn without_channel(reporting_node: NodeId, reason: FailureReason) -> Self {
        Self {
            reporting_node,
            reason,
            report_channel: false,
        }
    }
}

/// A fixed set of candidate routes plus scripted channel failures.
///
/// Discovery returns the admitted routes toward the requested destination in
/// insertion order. An attempt fails at the first hop whose channel has a
/// scripted failure and settles otherwise.
pub struct InMemoryNetwork {
    routes: Vec<Route>,
    failures: DashMap<ChannelId, ScriptedFailure>,
    attempts: AtomicUsize,
    attempt_delay: Option<Duration>,
}

impl InMemoryNetwork {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            failures: DashMap::new(),
            attempts: AtomicUsize::new(0),
            attempt_delay: None,
        }
    }

    /// Delay every attempt, to exercise timeouts.
    pub fn with_attempt_delay(mut self, delay: Duration) -> Self {
        self.attempt_delay = Some(delay);
        self
    }

    pub fn fail_at(&self, channel: ChannelId, failure: ScriptedFailure) {
        self.failures.insert(channel, failure);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RouteDiscovery for InMemoryNetwork {
    async fn find_routes(
        &self,
        request: &RouteRequest,
        exclusions: &ExclusionSet,
    ) -> Result<Vec<Route>, CollaboratorError> {
        let routes: Vec<Route> = self
            .routes
            .iter()
            .filter(|route| route.destination() == &request.destination)
            .filter(|route| exclusions.admits(route))
            .cloned()
            .collect();
        tracing::debug!(
            candidates = routes.len(),
            excluded = exclusions.len(),
            "in-memory route discovery"
        );
        Ok(routes)
    }
}

#[async_trait]
impl PaymentExecutor for InMemoryNetwork {
    async fn attempt(&self, route: &Route) -> Result<AttemptOutcome, CollaboratorError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.attempt_delay {
            tokio::time::sleep(delay).await;
        }

        let failure = route
            .hops()
            .iter()
            .find_map(|hop| self.failures.get(&hop.channel).map(|f| (hop.channel, f.value().clone())));

        if let Some((channel, failure)) = failure {
            let mut report =
                FailureReport::new(failure.reporting_node, failure.reason, route.attempted_hops());
            if failure.report_channel {
                report = report.with_failing_channel(channel);
            }
            return Ok(AttemptOutcome::Failed(report));
        }

        let sent = route.hops()[0].forward_mtokens.value();
        let delivered = route.delivered_mtokens().value();
        Ok(AttemptOutcome::Settled(PaymentSuccess {
            secret: uuid::Uuid::now_v7().simple().to_string(),
            fee_mtokens: Millitokens(sent.saturating_sub(delivered)),
        }))
    }
}
