//! Property tests: confidence bounds and mapper determinism.

use std::collections::HashSet;

use hopguard_core::{Confidence, FailureReason, Millitokens, CONFIDENCE_SCALE};
use hopguard_integration_tests::{chan, key};
use hopguard_routing::{
    AttemptedHop, ConfidenceAggregator, ExclusionMapper, FailureReport, ForwardingEdge,
    NodeReputation, ReputationSnapshot,
};
use proptest::prelude::*;

fn arbitrary_confidence() -> impl Strategy<Value = Confidence> {
    (0u64..=2_000_000).prop_map(Confidence::new)
}

/// One forwarding node: optional base, optional channel record with threshold.
fn arbitrary_node() -> impl Strategy<Value = (Option<Confidence>, Option<(Confidence, u64)>, u64)> {
    (
        prop::option::of(arbitrary_confidence()),
        prop::option::of((arbitrary_confidence(), 0u64..=10_000)),
        0u64..=10_000,
    )
}

fn arbitrary_reason() -> impl Strategy<Value = FailureReason> {
    (0..FailureReason::KNOWN.len()).prop_map(|i| FailureReason::KNOWN[i].clone())
}

proptest! {
    #[test]
    fn route_confidence_stays_in_range(nodes in prop::collection::vec(arbitrary_node(), 1..20)) {
        let mut records = Vec::new();
        let mut edges = Vec::new();
        let mut factors = Vec::new();

        for (i, (base, channel, mtokens)) in nodes.iter().enumerate() {
            let from = key(i as u8);
            let mut record = NodeReputation::new(from.clone());
            if let Some(base) = base {
                record = record.with_base(*base);
            }
            if let Some((confidence, threshold)) = channel {
                record = record.with_channel(chan(i as u32 + 1), *confidence, Some(Millitokens(*threshold)));
            }
            records.push(record);

            let edge = ForwardingEdge {
                channel: chan(i as u32 + 1),
                from_node: from,
                to_node: key(i as u8 + 1),
                forward_mtokens: Millitokens(*mtokens),
            };
            edges.push(edge);
        }

        let snapshot = ReputationSnapshot::from_records(records);
        let aggregator = ConfidenceAggregator::with_defaults();
        for edge in &edges {
            factors.push(snapshot.edge_confidence(edge, aggregator.default_confidence()).confidence);
        }

        let confidence = aggregator.from_reputation(&edges, &snapshot);
        prop_assert!(confidence.value() <= CONFIDENCE_SCALE);
        // A product of probabilities never exceeds its smallest factor.
        let smallest = factors.iter().min().copied().unwrap_or(Confidence::FULL);
        prop_assert!(confidence <= smallest);
    }

    #[test]
    fn combine_never_exceeds_either_side(a in arbitrary_confidence(), b in arbitrary_confidence()) {
        let joint = a.combine(b);
        prop_assert!(joint <= a);
        prop_assert!(joint <= b);
        prop_assert_eq!(joint, b.combine(a));
    }

    #[test]
    fn derive_exclusions_is_deterministic(
        len in 1usize..6,
        reporter in 0u8..8,
        failing in prop::option::of(0usize..8),
        reason in arbitrary_reason(),
    ) {
        let hops: Vec<AttemptedHop> = (0..len)
            .map(|i| AttemptedHop::new(chan(i as u32 + 1), key(i as u8 + 1)))
            .collect();
        let mut report = FailureReport::new(key(reporter), reason, hops);
        if let Some(index) = failing {
            report = report.with_failing_channel(chan(index as u32 + 1));
        }

        let mapper = ExclusionMapper::with_defaults();
        let first = mapper.derive_exclusions(&report);
        let second = mapper.derive_exclusions(&report);

        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(
                    serde_json::to_vec(&a).unwrap(),
                    serde_json::to_vec(&b).unwrap()
                );
                let mut seen = HashSet::new();
                for directive in &a.exclusions {
                    prop_assert!(seen.insert((directive.channel(), directive.reason().clone(), directive.to_node().clone())));
                    prop_assert_eq!(directive.reason(), report.reason.as_ref().unwrap());
                }
            }
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            _ => prop_assert!(false, "derivation outcome changed between calls"),
        }
    }
}
