use hopguard_core::{ChannelId, NodeId};
use serde::{Deserialize, Serialize};

use crate::exclusion::ExclusionDirective;
use crate::route::Route;

/// Exclusions accumulated across payment attempts, in arrival order.
///
/// A directive is only kept when it blocks something not already blocked:
/// an edge directive for the same traversal under a different reason adds
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    directives: Vec<ExclusionDirective>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge directives and return how many were new.
    pub fn merge(&mut self, directives: impl IntoIterator<Item = ExclusionDirective>) -> usize {
        let mut added = 0;
        for directive in directives {
            if !self.covers(&directive) {
                self.directives.push(directive);
                added += 1;
            }
        }
        added
    }

    fn covers(&self, directive: &ExclusionDirective) -> bool {
        self.directives.iter().any(|existing| match (existing, directive) {
            (
                ExclusionDirective::IncomingNode { to_node: a, .. },
                ExclusionDirective::IncomingNode { to_node: b, .. },
            ) => a == b,
            (
                ExclusionDirective::Edge {
                    channel: c1,
                    from_node: f1,
                    to_node: t1,
                    ..
                },
                ExclusionDirective::Edge {
                    channel: c2,
                    from_node: f2,
                    to_node: t2,
                    ..
                },
            ) => c1 == c2 && f1 == f2 && t1 == t2,
            _ => false,
        })
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn directives(&self) -> &[ExclusionDirective] {
        &self.directives
    }

    /// Nodes that must not be routed into, for discovery node blacklists.
    pub fn incoming_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.directives.iter().filter_map(|d| match d {
            ExclusionDirective::IncomingNode { to_node, .. } => Some(to_node),
            ExclusionDirective::Edge { .. } => None,
        })
    }

    pub fn excludes_node_incoming(&self, node: &NodeId) -> bool {
        self.incoming_nodes().any(|n| n == node)
    }

    /// Whether traversing `channel` into `to` is blocked. A `from` of `None`
    /// matches edge directives regardless of their origin.
    pub fn excludes_edge(&self, channel: &ChannelId, from: Option<&NodeId>, to: &NodeId) -> bool {
        self.directives.iter().any(|d| match d {
            ExclusionDirective::IncomingNode { to_node, .. } => to_node == to,
            ExclusionDirective::Edge {
                channel: blocked,
                from_node,
                to_node,
                ..
            } => {
                blocked == channel
                    && to_node == to
                    && match (from_node, from) {
                        (Some(expected), Some(actual)) => expected == actual,
                        _ => true,
                    }
            }
        })
    }

    /// True when no hop of `route` is blocked.
    pub fn admits(&self, route: &Route) -> bool {
        let hops = route.hops();
        !hops.iter().enumerate().any(|(i, hop)| {
            let from = i.checked_sub(1).map(|prev| &hops[prev].to_node);
            self.excludes_edge(&hop.channel, from, &hop.to_node)
        })
    }
}
