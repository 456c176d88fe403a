//! `hopguard confidence`: estimate a route's success probability.

use std::path::PathBuf;

use clap::Args;
use hopguard_core::{Confidence, EngineConfig, NodeId};
use hopguard_routing::{ConfidenceAggregator, ConfidenceResult, Hop, InMemoryBackend, ReputationSnapshot};
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct ConfidenceArgs {
    /// JSON document with `hops`, `reputation`, and a source node.
    #[arg(short, long)]
    pub input: PathBuf,
}

/// A live per-hop probability, standing in for a node that supports the query.
#[derive(Debug, Deserialize)]
struct LiveHop {
    from_node: NodeId,
    to_node: NodeId,
    confidence: Confidence,
}

#[derive(Debug, Deserialize)]
struct ConfidenceInput {
    /// Route source; defaults to `local_node`.
    #[serde(default)]
    from: Option<NodeId>,
    #[serde(default)]
    local_node: Option<NodeId>,
    #[serde(default)]
    hops: Vec<Hop>,
    #[serde(default)]
    reputation: ReputationSnapshot,
    #[serde(default)]
    hop_confidence: Vec<LiveHop>,
}

async fn estimate(input: ConfidenceInput, config: &EngineConfig) -> anyhow::Result<ConfidenceResult> {
    let local = match input.local_node.or_else(|| input.from.clone()) {
        Some(node) => node,
        None => anyhow::bail!("input needs `from` or `local_node`"),
    };

    let backend = InMemoryBackend::with_snapshot(local, &input.reputation);
    for live in input.hop_confidence {
        backend.set_hop_confidence(live.from_node, live.to_node, live.confidence);
    }

    let aggregator = ConfidenceAggregator::new(&config.confidence);
    let result = aggregator
        .route_confidence(&backend, input.from.as_ref(), &input.hops)
        .await?;
    Ok(result)
}

pub async fn run(args: &ConfidenceArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let input: ConfidenceInput = super::read_json(&args.input)?;
    let result = estimate(input, config).await?;
    tracing::info!(confidence = result.confidence.value(), "estimated route confidence");
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
