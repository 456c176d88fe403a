use std::sync::Arc;

use chrono::{DateTime, Utc};
use hopguard_core::{Confidence, FailureReason, RetryConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::confidence::ConfidenceAggregator;
use crate::error::RoutingError;
use crate::exclusion::ExclusionMapper;
use crate::exclusion_set::ExclusionSet;
use crate::reputation::ReputationSnapshot;
use crate::route::{Route, RouteHop};
use crate::traits::{
    AttemptOutcome, HopConfidenceSource, PaymentExecutor, PaymentSuccess, ReputationSource,
    RouteDiscovery, RouteRequest,
};

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    Settled,
    Failed {
        reason: FailureReason,
        /// Directives this failure added to the accumulated set.
        excluded: usize,
    },
}

/// History entry for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub hops: Vec<RouteHop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub status: AttemptStatus,
}

/// A settled payment and how it got there.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub success: PaymentSuccess,
    pub attempts: Vec<AttemptRecord>,
    pub exclusions: ExclusionSet,
}

/// Collaborators used to rank candidate routes.
pub struct RouteScoring {
    pub aggregator: ConfidenceAggregator,
    pub reputation: Arc<dyn ReputationSource>,
    pub live: Option<Arc<dyn HopConfidenceSource>>,
}

/// Repeatedly discovers, attempts, and excludes until a payment settles.
pub struct PaymentRetryLoop {
    discovery: Arc<dyn RouteDiscovery>,
    executor: Arc<dyn PaymentExecutor>,
    mapper: ExclusionMapper,
    config: RetryConfig,
    scoring: Option<RouteScoring>,
}

impl PaymentRetryLoop {
    pub fn new(
        discovery: Arc<dyn RouteDiscovery>,
        executor: Arc<dyn PaymentExecutor>,
        mapper: ExclusionMapper,
        config: RetryConfig,
    ) -> Self {
        Self {
            discovery,
            executor,
            mapper,
            config,
            scoring: None,
        }
    }

    /// Rank candidates by estimated confidence before each attempt.
    pub fn with_scoring(mut self, scoring: RouteScoring) -> Self {
        self.scoring = Some(scoring);
        self
    }

    /// Pay `request`, bounded by the configured attempt count and wall clock.
    pub async fn run(&self, request: &RouteRequest) -> Result<PaymentOutcome, RoutingError> {
        let secs = self.config.timeout_secs;
        match tokio::time::timeout(self.config.timeout(), self.run_attempts(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs = secs, "payment timed out");
                Err(RoutingError::Timeout { secs })
            }
        }
    }

    async fn run_attempts(&self, request: &RouteRequest) -> Result<PaymentOutcome, RoutingError> {
        let mut exclusions = ExclusionSet::new();
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        loop {
            if attempts.len() >= self.config.max_attempts as usize {
                tracing::warn!(max_attempts = self.config.max_attempts, "attempts exhausted");
                return Err(RoutingError::AttemptsExhausted {
                    max_attempts: self.config.max_attempts,
                });
            }

            let candidates: Vec<Route> = self
                .discovery
                .find_routes(request, &exclusions)
                .await?
                .into_iter()
                .filter(|route| exclusions.admits(route))
                .collect();

            let Some((route, confidence)) = self.select(request, candidates).await? else {
                tracing::warn!(attempts = attempts.len(), "no admissible route left");
                return Err(RoutingError::RoutesExhausted {
                    attempts: attempts.len(),
                });
            };

            let id = Uuid::now_v7();
            let started_at = Utc::now();
            tracing::info!(
                attempt = attempts.len() + 1,
                attempt_id = %id,
                hops = route.hop_count(),
                confidence = confidence.map(|c| c.value()),
                "attempting payment"
            );

            let outcome = self.executor.attempt(&route).await?;
            let hops = route.hops().to_vec();

            match outcome {
                AttemptOutcome::Settled(success) => {
                    tracing::info!(attempt_id = %id, fee = %success.fee_mtokens, "payment settled");
                    attempts.push(AttemptRecord {
                        id,
                        started_at,
                        hops,
                        confidence,
                        status: AttemptStatus::Settled,
                    });
                    return Ok(PaymentOutcome {
                        success,
                        attempts,
                        exclusions,
                    });
                }
                AttemptOutcome::Failed(report) => {
                    let (reason, derived) = self.mapper.derive_with_reason(&report)?;

                    if derived.is_empty() {
                        tracing::warn!(%reason, "destination rejected payment");
                        return Err(RoutingError::DestinationRejected { reason });
                    }

                    let added = exclusions.merge(derived.exclusions);
                    tracing::warn!(
                        attempt_id = %id,
                        %reason,
                        added,
                        total = exclusions.len(),
                        "payment attempt failed"
                    );
                    attempts.push(AttemptRecord {
                        id,
                        started_at,
                        hops,
                        confidence,
                        status: AttemptStatus::Failed {
                            reason,
                            excluded: added,
                        },
                    });

                    if added == 0 {
                        return Err(RoutingError::NoProgress {
                            attempts: attempts.len(),
                        });
                    }
                }
            }
        }
    }

    /// Pick the next route: the first candidate, or the most confident one
    /// above the floor when scoring is attached. Ties keep discovery order.
    async fn select(
        &self,
        request: &RouteRequest,
        candidates: Vec<Route>,
    ) -> Result<Option<(Route, Option<Confidence>)>, RoutingError> {
        let Some(scoring) = &self.scoring else {
            return Ok(candidates.into_iter().next().map(|route| (route, None)));
        };

        let mut snapshot: Option<ReputationSnapshot> = None;
        let mut scored = Vec::with_capacity(candidates.len());

        for route in candidates {
            let edges = route.edges(&request.source);

            let live = match &scoring.live {
                Some(query) => scoring.aggregator.from_live_queries(query.as_ref(), &edges).await?,
                None => None,
            };
            let confidence = match live {
                Some(confidence) => confidence,
                None => {
                    let reputations = match &mut snapshot {
                        Some(reputations) => reputations,
                        None => {
                            let fetched = scoring.reputation.forwarding_reputations().await?;
                            snapshot.insert(fetched)
                        }
                    };
                    scoring.aggregator.from_reputation(&edges, reputations)
                }
            };

            if confidence < self.config.min_confidence {
                tracing::debug!(
                    confidence = confidence.value(),
                    floor = self.config.min_confidence.value(),
                    "skipping low confidence route"
                );
                continue;
            }
            scored.push((route, Some(confidence)));
        }

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(scored.into_iter().next())
    }
}
