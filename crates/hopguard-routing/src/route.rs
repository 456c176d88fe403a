use hopguard_core::{ChannelId, Millitokens, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::exclusion::AttemptedHop;

/// A hop as decoded from a collaborator response. Identifiers are optional
/// here because upstream data may omit them; [`checked_hops`] enforces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    /// Channel traversed to reach `to_node`.
    #[serde(default)]
    pub channel: Option<ChannelId>,
    /// Node this hop forwards to.
    #[serde(default, alias = "public_key")]
    pub to_node: Option<NodeId>,
    /// Amount forwarded across this hop.
    pub forward_mtokens: Millitokens,
}

impl Hop {
    pub fn new(channel: ChannelId, to_node: NodeId, forward_mtokens: Millitokens) -> Self {
        Self {
            channel: Some(channel),
            to_node: Some(to_node),
            forward_mtokens,
        }
    }
}

/// A hop whose channel and destination are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub channel: ChannelId,
    pub to_node: NodeId,
    pub forward_mtokens: Millitokens,
}

impl From<RouteHop> for Hop {
    fn from(hop: RouteHop) -> Self {
        Hop::new(hop.channel, hop.to_node, hop.forward_mtokens)
    }
}

/// A directed traversal of one channel, carrying the amount forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingEdge {
    pub channel: ChannelId,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub forward_mtokens: Millitokens,
}

/// Validate decoded hops: non-empty, every hop with a channel and a node.
pub fn checked_hops(hops: &[Hop]) -> Result<Vec<RouteHop>, RoutingError> {
    if hops.is_empty() {
        return Err(RoutingError::InvalidHopSet {
            reason: "route has no hops".into(),
        });
    }

    hops.iter()
        .enumerate()
        .map(|(index, hop)| match (hop.channel, &hop.to_node) {
            (Some(channel), Some(to_node)) => Ok(RouteHop {
                channel,
                to_node: to_node.clone(),
                forward_mtokens: hop.forward_mtokens,
            }),
            _ => Err(RoutingError::InvalidHopSet {
                reason: format!("hop {} is missing a channel or destination node", index),
            }),
        })
        .collect()
}

/// Edge *i* runs from `source` (i = 0) or hop *i-1*'s node to hop *i*'s node.
pub fn forwarding_edges(source: &NodeId, hops: &[RouteHop]) -> Vec<ForwardingEdge> {
    hops.iter()
        .enumerate()
        .map(|(i, hop)| ForwardingEdge {
            channel: hop.channel,
            from_node: if i == 0 {
                source.clone()
            } else {
                hops[i - 1].to_node.clone()
            },
            to_node: hop.to_node.clone(),
            forward_mtokens: hop.forward_mtokens,
        })
        .collect()
}

/// A candidate route returned by route discovery: an ordered, non-empty
/// list of hops from the local node toward the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RouteHop>", into = "Vec<RouteHop>")]
pub struct Route {
    hops: Vec<RouteHop>,
}

impl TryFrom<Vec<RouteHop>> for Route {
    type Error = RoutingError;

    fn try_from(hops: Vec<RouteHop>) -> Result<Self, Self::Error> {
        Self::new(hops)
    }
}

impl From<Route> for Vec<RouteHop> {
    fn from(route: Route) -> Self {
        route.hops
    }
}

impl Route {
    /// Create a route from a list of hops.
    pub fn new(hops: Vec<RouteHop>) -> Result<Self, RoutingError> {
        if hops.is_empty() {
            return Err(RoutingError::InvalidHopSet {
                reason: "route has no hops".into(),
            });
        }
        Ok(Self { hops })
    }

    /// The ordered hop entries.
    pub fn hops(&self) -> &[RouteHop] {
        &self.hops
    }

    /// Number of hops in this route.
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// The final node of the route.
    pub fn destination(&self) -> &NodeId {
        &self.hops[self.hops.len() - 1].to_node
    }

    /// Amount delivered to the destination.
    pub fn delivered_mtokens(&self) -> Millitokens {
        self.hops[self.hops.len() - 1].forward_mtokens
    }

    /// Returns true if any hop traverses `channel`.
    pub fn uses_channel(&self, channel: &ChannelId) -> bool {
        self.hops.iter().any(|h| &h.channel == channel)
    }

    /// Forwarding edges of this route when sent from `source`.
    pub fn edges(&self, source: &NodeId) -> Vec<ForwardingEdge> {
        forwarding_edges(source, &self.hops)
    }

    /// The hop list in the shape a payment failure report carries.
    pub fn attempted_hops(&self) -> Vec<AttemptedHop> {
        self.hops
            .iter()
            .map(|h| AttemptedHop::new(h.channel, h.to_node.clone()))
            .collect()
    }
}
