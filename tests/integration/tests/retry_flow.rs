//! Integration test: the retry loop driving discovery, scoring, execution,
//! and exclusion against in-memory collaborators.

use std::sync::Arc;

use hopguard_core::{Confidence, EngineConfig, FailureReason, Millitokens, RetryConfig};
use hopguard_integration_tests::{chan, hops, key, route};
use hopguard_routing::{
    AttemptStatus, ConfidenceAggregator, ExclusionMapper, ExclusionRules, InMemoryBackend,
    InMemoryNetwork, NodeReputation, PaymentRetryLoop, RouteRequest, RouteScoring, RoutingError,
    ScriptedFailure,
};

fn request() -> RouteRequest {
    RouteRequest {
        source: key(0),
        destination: key(9),
        mtokens: Millitokens(1_000),
    }
}

// =========================================================================
// End-to-end recovery
// =========================================================================

#[tokio::test]
async fn test_recovers_from_unknown_next_peer() {
    // Node 1 does not know node 2; the route through node 3 works.
    let network = Arc::new(InMemoryNetwork::new(vec![
        route(&[(1, 1), (2, 2), (3, 9)], 1_000),
        route(&[(1, 1), (4, 3), (5, 9)], 1_000),
        route(&[(6, 4), (7, 9)], 1_000),
    ]));
    network.fail_at(
        chan(1),
        ScriptedFailure::at_channel(key(1), FailureReason::UnknownNextPeer),
    );

    let config = EngineConfig::default();
    let retry = PaymentRetryLoop::new(
        network.clone(),
        network.clone(),
        ExclusionMapper::new(ExclusionRules::from_config(&config.exclusion)),
        config.retry.clone(),
    );
    let outcome = retry.run(&request()).await.unwrap();

    // The first failure blocks 1x1x1 into node 1 and 2x2x2 out of it; the
    // second route still uses 1x1x1 and is filtered out.
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[1].hops[0].channel, chan(6));
    assert_eq!(outcome.attempts[1].status, AttemptStatus::Settled);
    assert_eq!(outcome.exclusions.len(), 2);
    assert_eq!(network.attempts(), 2);
}

#[tokio::test]
async fn test_attempt_history_is_ordered() {
    let network = Arc::new(InMemoryNetwork::new(vec![
        route(&[(1, 1), (2, 9)], 1_000),
        route(&[(3, 3), (4, 9)], 1_000),
        route(&[(5, 5), (6, 9)], 1_000),
    ]));
    network.fail_at(
        chan(2),
        ScriptedFailure::at_channel(key(1), FailureReason::FeeInsufficient),
    );
    network.fail_at(
        chan(4),
        ScriptedFailure::at_channel(key(3), FailureReason::TemporaryNodeFailure),
    );

    let retry = PaymentRetryLoop::new(
        network.clone(),
        network,
        ExclusionMapper::with_defaults(),
        RetryConfig::default(),
    );
    let outcome = retry.run(&request()).await.unwrap();

    assert_eq!(outcome.attempts.len(), 3);
    assert_ne!(outcome.attempts[0].id, outcome.attempts[1].id);
    assert!(outcome.attempts[0].started_at <= outcome.attempts[2].started_at);
    assert!(matches!(
        outcome.attempts[1].status,
        AttemptStatus::Failed {
            reason: FailureReason::TemporaryNodeFailure,
            excluded: 2
        }
    ));
}

// =========================================================================
// Scoring
// =========================================================================

#[tokio::test]
async fn test_live_scores_rank_candidates() {
    let network = Arc::new(InMemoryNetwork::new(vec![
        route(&[(1, 1), (2, 9)], 1_000),
        route(&[(3, 3), (4, 9)], 1_000),
    ]));
    let backend = Arc::new(InMemoryBackend::new(key(0)));
    backend.set_hop_confidence(key(0), key(1), Confidence::new(500_000));
    backend.set_hop_confidence(key(1), key(9), Confidence::new(500_000));
    backend.set_hop_confidence(key(0), key(3), Confidence::new(900_000));
    backend.set_hop_confidence(key(3), key(9), Confidence::new(900_000));

    let retry = PaymentRetryLoop::new(
        network.clone(),
        network,
        ExclusionMapper::with_defaults(),
        RetryConfig::default(),
    )
    .with_scoring(RouteScoring {
        aggregator: ConfidenceAggregator::with_defaults(),
        reputation: backend.clone(),
        live: Some(backend.clone()),
    });
    let outcome = retry.run(&request()).await.unwrap();

    assert_eq!(outcome.attempts[0].hops[0].channel, chan(3));
    assert_eq!(outcome.attempts[0].confidence, Some(Confidence::new(810_000)));
    assert_eq!(backend.reputation_queries(), 0);
}

#[tokio::test]
async fn test_failed_live_query_aborts_loop() {
    let network = Arc::new(InMemoryNetwork::new(vec![route(&[(1, 1), (2, 9)], 1_000)]));
    let backend = Arc::new(InMemoryBackend::new(key(0)));
    backend.set_hop_confidence(key(0), key(1), Confidence::new(500_000));

    let retry = PaymentRetryLoop::new(
        network.clone(),
        network.clone(),
        ExclusionMapper::with_defaults(),
        RetryConfig::default(),
    )
    .with_scoring(RouteScoring {
        aggregator: ConfidenceAggregator::with_defaults(),
        reputation: backend.clone(),
        live: Some(backend),
    });
    let err = retry.run(&request()).await.unwrap_err();
    assert!(matches!(
        err,
        RoutingError::ConfidenceQueryFailed { hop_index: 1, .. }
    ));
    assert_eq!(network.attempts(), 0);
}

// =========================================================================
// Service-level confidence
// =========================================================================

#[tokio::test]
async fn test_route_confidence_uses_local_identity() {
    let backend = InMemoryBackend::new(key(0));
    backend.put_reputation(NodeReputation::new(key(0)).with_base(Confidence::new(500_000)));
    backend.put_reputation(
        NodeReputation::new(key(1))
            .with_base(Confidence::new(100_000))
            .with_channel(chan(2), Confidence::new(800_000), Some(Millitokens(500))),
    );

    let aggregator = ConfidenceAggregator::with_defaults();
    let result = aggregator
        .route_confidence(&backend, None, &hops(&[(1, 1), (2, 9)], 1_000))
        .await
        .unwrap();
    assert_eq!(result.confidence.value(), 400_000);

    // Below the channel threshold node 1 falls back to its base.
    let result = aggregator
        .route_confidence(&backend, None, &hops(&[(1, 1), (2, 9)], 100))
        .await
        .unwrap();
    assert_eq!(result.confidence.value(), 50_000);
}
