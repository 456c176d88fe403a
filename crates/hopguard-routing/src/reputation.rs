use std::collections::BTreeMap;

use hopguard_core::{ChannelId, Confidence, Millitokens, NodeId};
use serde::{Deserialize, Serialize};

use crate::route::ForwardingEdge;

/// Historical success rate of one of a node's channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReputation {
    pub channel: ChannelId,
    pub confidence: Confidence,
    /// Below this amount the record is not predictive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevant_mtokens: Option<Millitokens>,
}

/// Historical success rate of forwarding from a node to a specific peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReputation {
    #[serde(alias = "public_key")]
    pub to_node: NodeId,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_relevant_mtokens: Option<Millitokens>,
}

/// Everything known about one forwarding node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReputation {
    #[serde(alias = "public_key")]
    pub node: NodeId,
    /// Node-wide success rate; absent when nothing general is known.
    #[serde(default, alias = "confidence", skip_serializing_if = "Option::is_none")]
    pub base_confidence: Option<Confidence>,
    #[serde(default)]
    pub channels: Vec<ChannelReputation>,
    #[serde(default)]
    pub peers: Vec<PeerReputation>,
}

impl NodeReputation {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            base_confidence: None,
            channels: Vec::new(),
            peers: Vec::new(),
        }
    }

    pub fn with_base(mut self, confidence: Confidence) -> Self {
        self.base_confidence = Some(confidence);
        self
    }

    pub fn with_channel(
        mut self,
        channel: ChannelId,
        confidence: Confidence,
        min_relevant_mtokens: Option<Millitokens>,
    ) -> Self {
        self.channels.push(ChannelReputation {
            channel,
            confidence,
            min_relevant_mtokens,
        });
        self
    }

    pub fn with_peer(
        mut self,
        to_node: NodeId,
        confidence: Confidence,
        min_relevant_mtokens: Option<Millitokens>,
    ) -> Self {
        self.peers.push(PeerReputation {
            to_node,
            confidence,
            min_relevant_mtokens,
        });
        self
    }
}

/// Which record decided an edge's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Peer,
    Channel,
    /// No specific record matched; the node's base confidence applied.
    NodeBase,
    /// A specific record matched but the amount was below its threshold.
    NodeBaseBelowThreshold,
    /// The node has a record but no base confidence.
    DefaultNoBase,
    /// The node has no record at all.
    DefaultUnknownNode,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Peer => "peer",
            Self::Channel => "channel",
            Self::NodeBase => "base",
            Self::NodeBaseBelowThreshold => "base_below_threshold",
            Self::DefaultNoBase => "default_no_base",
            Self::DefaultUnknownNode => "default_unknown_node",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeConfidence {
    pub confidence: Confidence,
    pub resolution: Resolution,
}

/// Read-only view of the reputation store, indexed by node.
///
/// When the store returns the same node twice the first record wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr", into = "SnapshotRepr")]
pub struct ReputationSnapshot {
    nodes: BTreeMap<NodeId, NodeReputation>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotRepr {
    #[serde(default)]
    nodes: Vec<NodeReputation>,
}

impl From<SnapshotRepr> for ReputationSnapshot {
    fn from(repr: SnapshotRepr) -> Self {
        Self::from_records(repr.nodes)
    }
}

impl From<ReputationSnapshot> for SnapshotRepr {
    fn from(snapshot: ReputationSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes.into_values().collect(),
        }
    }
}

impl ReputationSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = NodeReputation>) -> Self {
        let mut nodes = BTreeMap::new();
        for record in records {
            nodes.entry(record.node.clone()).or_insert(record);
        }
        Self { nodes }
    }

    pub fn get(&self, node: &NodeId) -> Option<&NodeReputation> {
        self.nodes.get(node)
    }

    pub fn records(&self) -> impl Iterator<Item = &NodeReputation> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve the success probability of one forwarding edge.
    ///
    /// A peer record for `(from, to)` is preferred over a channel record for
    /// the edge's channel. The chosen record only counts when the forwarded
    /// amount reaches its threshold; otherwise, and when nothing specific
    /// matches, the origin node's base confidence is used. `default` covers
    /// nodes without a base confidence, including a below-threshold record on
    /// such a node. That case deliberately scores `default` rather than zero.
    pub fn edge_confidence(&self, edge: &ForwardingEdge, default: Confidence) -> EdgeConfidence {
        let Some(node) = self.nodes.get(&edge.from_node) else {
            return EdgeConfidence {
                confidence: default,
                resolution: Resolution::DefaultUnknownNode,
            };
        };

        let peer = node
            .peers
            .iter()
            .find(|p| p.to_node == edge.to_node)
            .map(|p| (p.confidence, p.min_relevant_mtokens, Resolution::Peer));
        let specific = peer.or_else(|| {
            node.channels
                .iter()
                .find(|c| c.channel == edge.channel)
                .map(|c| (c.confidence, c.min_relevant_mtokens, Resolution::Channel))
        });

        let base = |resolution: Resolution| match node.base_confidence {
            Some(confidence) => EdgeConfidence {
                confidence,
                resolution,
            },
            None => EdgeConfidence {
                confidence: default,
                resolution: Resolution::DefaultNoBase,
            },
        };

        match specific {
            Some((confidence, threshold, resolution)) => {
                let relevant = threshold.map_or(true, |min| edge.forward_mtokens >= min);
                if relevant {
                    EdgeConfidence {
                        confidence,
                        resolution,
                    }
                } else {
                    base(Resolution::NodeBaseBelowThreshold)
                }
            }
            None => base(Resolution::NodeBase),
        }
    }
}
