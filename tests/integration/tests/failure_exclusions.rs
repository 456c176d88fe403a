//! Integration test: failure reports flowing through the mapper into an
//! exclusion set that filters candidate routes.

use hopguard_core::{EngineConfig, ExclusionPolicy, FailureReason};
use hopguard_integration_tests::{attempted, chan, key, route};
use hopguard_routing::{
    ErrorKind, ExclusionDirective, ExclusionMapper, ExclusionRules, ExclusionSet, FailureReport,
};

// =========================================================================
// Worked cases
// =========================================================================

#[test]
fn test_final_node_rejection_is_not_a_routing_failure() {
    let report = FailureReport::new(
        key(0),
        FailureReason::UnknownPaymentHash,
        attempted(&[(0, 0)]),
    );
    let derived = ExclusionMapper::with_defaults().derive_exclusions(&report).unwrap();
    assert_eq!(serde_json::to_value(&derived).unwrap(), serde_json::json!({"exclusions": []}));
}

#[test]
fn test_incorrect_expiry_json_output() {
    let report = FailureReport::new(
        key(9),
        FailureReason::IncorrectCltvExpiry,
        attempted(&[(1, 1), (2, 2)]),
    )
    .with_failing_channel(chan(2));
    let derived = ExclusionMapper::with_defaults().derive_exclusions(&report).unwrap();

    assert_eq!(
        serde_json::to_value(&derived).unwrap(),
        serde_json::json!({
            "exclusions": [
                {
                    "kind": "edge",
                    "channel": "2x2x2",
                    "reason": "IncorrectCltvExpiry",
                    "from_node": key(1).to_string(),
                    "to_node": key(2).to_string()
                },
                {
                    "kind": "incoming_node",
                    "reason": "IncorrectCltvExpiry",
                    "to_node": key(1).to_string()
                }
            ]
        })
    );
}

#[test]
fn test_unknown_next_peer_blocks_both_edges() {
    let report = FailureReport::new(
        key(1),
        FailureReason::UnknownNextPeer,
        attempted(&[(1, 1), (2, 2)]),
    )
    .with_failing_channel(chan(1));
    let derived = ExclusionMapper::with_defaults().derive_exclusions(&report).unwrap();

    let channels: Vec<_> = derived.exclusions.iter().map(|d| d.channel()).collect();
    assert_eq!(channels, vec![Some(chan(1)), Some(chan(2))]);
    assert_eq!(derived.exclusions[0].from_node(), None);
    assert_eq!(derived.exclusions[1].from_node(), Some(&key(1)));
}

// =========================================================================
// Mapper output feeding the accumulated set
// =========================================================================

#[test]
fn test_exclusions_filter_candidate_routes() {
    let mapper = ExclusionMapper::with_defaults();
    let mut set = ExclusionSet::new();

    let failed = route(&[(1, 1), (2, 2), (3, 9)], 1_000);
    let report = FailureReport::new(
        key(2),
        FailureReason::TemporaryNodeFailure,
        failed.attempted_hops(),
    )
    .with_failing_channel(chan(3));
    let added = set.merge(mapper.derive_exclusions(&report).unwrap().exclusions);
    assert_eq!(added, 2);

    // Blocked edge 3x3x3 from node 2.
    assert!(!set.admits(&failed));
    // Any route into node 2 is blocked.
    assert!(!set.admits(&route(&[(5, 5), (6, 2), (7, 9)], 1_000)));
    // A disjoint route is fine.
    assert!(set.admits(&route(&[(5, 5), (8, 9)], 1_000)));

    // Re-reporting the same failure adds nothing.
    assert_eq!(
        set.merge(mapper.derive_exclusions(&report).unwrap().exclusions),
        0
    );
}

// =========================================================================
// Rule table as configuration
// =========================================================================

#[test]
fn test_rule_override_from_toml() {
    let config: EngineConfig = toml_config(
        r#"
[exclusion.rules]
TemporaryChannelFailure = "edge_and_origin_node"
"#,
    );
    let mapper = ExclusionMapper::new(ExclusionRules::from_config(&config.exclusion));
    assert_eq!(
        mapper
            .rules()
            .policy_for(&FailureReason::TemporaryChannelFailure),
        Some(ExclusionPolicy::EdgeAndOriginNode)
    );

    let report = FailureReport::new(
        key(1),
        FailureReason::TemporaryChannelFailure,
        attempted(&[(1, 1), (2, 2)]),
    )
    .with_failing_channel(chan(2));
    let derived = mapper.derive_exclusions(&report).unwrap();
    assert!(matches!(
        derived.exclusions.last(),
        Some(ExclusionDirective::IncomingNode { .. })
    ));
}

#[test]
fn test_new_failure_code_is_not_silently_ignored() {
    let json = format!(
        r#"{{"reporting_node":"{}","reason":"InvalidOnionBlinding",
            "attempted_hops":[{{"channel":"1x1x1","to_node":"{}"}}]}}"#,
        key(1),
        key(1)
    );
    let report: FailureReport = serde_json::from_str(&json).unwrap();
    let err = ExclusionMapper::with_defaults()
        .derive_exclusions(&report)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedReason);
}

fn toml_config(text: &str) -> EngineConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hopguard.toml");
    std::fs::write(&path, text).unwrap();
    EngineConfig::load(&path).unwrap()
}
