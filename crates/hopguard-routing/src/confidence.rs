use std::time::Duration;

use hopguard_core::{Confidence, ConfidenceConfig, NodeId, CONFIDENCE_SCALE};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::reputation::ReputationSnapshot;
use crate::route::{checked_hops, forwarding_edges, ForwardingEdge, Hop};
use crate::traits::{HopConfidenceSource, HopQueryOutcome, LocalIdentity, ReputationSource};

/// Estimated probability that a whole route completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub confidence: Confidence,
}

/// Scores routes from live per-hop queries or, failing that, from the
/// reputation snapshot.
#[derive(Debug, Clone)]
pub struct ConfidenceAggregator {
    default_confidence: Confidence,
    hop_query_timeout: Option<Duration>,
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ConfidenceAggregator {
    pub fn new(config: &ConfidenceConfig) -> Self {
        Self {
            default_confidence: config.default_confidence,
            hop_query_timeout: config.hop_query_timeout(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&ConfidenceConfig::default())
    }

    pub fn default_confidence(&self) -> Confidence {
        self.default_confidence
    }

    /// Combine per-edge reputation confidences.
    ///
    /// The product is accumulated exactly and divided by `1e6^(n-1)`; the
    /// quotient is truncated.
    pub fn from_reputation(
        &self,
        edges: &[ForwardingEdge],
        snapshot: &ReputationSnapshot,
    ) -> Confidence {
        if edges.is_empty() {
            return Confidence::FULL;
        }

        let mut product = BigUint::one();
        for (index, edge) in edges.iter().enumerate() {
            let resolved = snapshot.edge_confidence(edge, self.default_confidence);
            tracing::debug!(
                hop = index,
                channel = %edge.channel,
                from = edge.from_node.short(),
                to = edge.to_node.short(),
                resolution = resolved.resolution.as_str(),
                confidence = resolved.confidence.value(),
                "resolved edge confidence"
            );
            product *= BigUint::from(resolved.confidence.value());
        }

        let divisor = BigUint::from(CONFIDENCE_SCALE).pow(edges.len() as u32 - 1);
        (product / divisor)
            .to_u64()
            .map_or(Confidence::FULL, Confidence::new)
    }

    /// Fold live per-hop queries left to right.
    ///
    /// Returns `Ok(None)` as soon as any hop reports the query as
    /// unsupported; no partial product escapes in that case.
    pub async fn from_live_queries<Q>(
        &self,
        query: &Q,
        edges: &[ForwardingEdge],
    ) -> Result<Option<Confidence>, RoutingError>
    where
        Q: HopConfidenceSource + ?Sized,
    {
        let mut running = Confidence::FULL;

        for (index, edge) in edges.iter().enumerate() {
            let outcome = match self.hop_query_timeout {
                Some(limit) => tokio::time::timeout(limit, query.hop_confidence(edge))
                    .await
                    .map_err(|_| RoutingError::ConfidenceQueryFailed {
                        hop_index: index,
                        message: format!("query timed out after {}ms", limit.as_millis()),
                    })?,
                None => query.hop_confidence(edge).await,
            };

            match outcome {
                HopQueryOutcome::Supported(confidence) => {
                    running = running.combine(confidence);
                    tracing::debug!(
                        hop = index,
                        channel = %edge.channel,
                        resolution = "live",
                        confidence = confidence.value(),
                        running = running.value(),
                        "live hop confidence"
                    );
                }
                HopQueryOutcome::Unsupported => {
                    tracing::debug!(hop = index, "live hop query unsupported, using reputation");
                    return Ok(None);
                }
                HopQueryOutcome::Failed(err) => {
                    tracing::warn!(hop = index, error = %err, "live hop query failed");
                    return Err(RoutingError::ConfidenceQueryFailed {
                        hop_index: index,
                        message: err.message,
                    });
                }
            }
        }

        Ok(Some(running))
    }

    /// Estimate the success probability of `hops` sent from `source`.
    pub async fn estimate(
        &self,
        source: &NodeId,
        hops: &[Hop],
        snapshot: &ReputationSnapshot,
        live: Option<&dyn HopConfidenceSource>,
    ) -> Result<ConfidenceResult, RoutingError> {
        let hops = checked_hops(hops)?;
        let edges = forwarding_edges(source, &hops);

        if let Some(query) = live {
            if let Some(confidence) = self.from_live_queries(query, &edges).await? {
                return Ok(ConfidenceResult { confidence });
            }
        }

        Ok(ConfidenceResult {
            confidence: self.from_reputation(&edges, snapshot),
        })
    }

    /// Estimate against a backend that provides every collaborator.
    ///
    /// Hops are validated before any call. The source defaults to the local
    /// node, and reputations are only fetched when live queries are
    /// unavailable.
    pub async fn route_confidence<B>(
        &self,
        backend: &B,
        from: Option<&NodeId>,
        hops: &[Hop],
    ) -> Result<ConfidenceResult, RoutingError>
    where
        B: ReputationSource + LocalIdentity + HopConfidenceSource + ?Sized,
    {
        let hops = checked_hops(hops)?;
        let source = match from {
            Some(node) => node.clone(),
            None => backend.local_node().await?,
        };
        let edges = forwarding_edges(&source, &hops);

        if let Some(confidence) = self.from_live_queries(backend, &edges).await? {
            return Ok(ConfidenceResult { confidence });
        }

        let snapshot = backend.forwarding_reputations().await?;
        Ok(ConfidenceResult {
            confidence: self.from_reputation(&edges, &snapshot),
        })
    }
}
