use std::collections::BTreeMap;

use hopguard_core::{ChannelId, ExclusionConfig, ExclusionPolicy, FailureReason, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// A hop as sent in a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptedHop {
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default, alias = "public_key")]
    pub to_node: Option<NodeId>,
}

impl AttemptedHop {
    pub fn new(channel: ChannelId, to_node: NodeId) -> Self {
        Self {
            channel: Some(channel),
            to_node: Some(to_node),
        }
    }
}

/// Structured failure returned by the payment executor.
///
/// Every field is optional on the wire; [`ExclusionMapper::derive_exclusions`]
/// reports which one is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    #[serde(default, alias = "public_key")]
    pub reporting_node: Option<NodeId>,
    #[serde(default, alias = "channel", skip_serializing_if = "Option::is_none")]
    pub failing_channel: Option<ChannelId>,
    #[serde(default)]
    pub reason: Option<FailureReason>,
    #[serde(default, alias = "hops")]
    pub attempted_hops: Option<Vec<AttemptedHop>>,
}

impl FailureReport {
    pub fn new(reporting_node: NodeId, reason: FailureReason, attempted_hops: Vec<AttemptedHop>) -> Self {
        Self {
            reporting_node: Some(reporting_node),
            failing_channel: None,
            reason: Some(reason),
            attempted_hops: Some(attempted_hops),
        }
    }

    pub fn with_failing_channel(mut self, channel: ChannelId) -> Self {
        self.failing_channel = Some(channel);
        self
    }
}

/// One graph element route discovery must avoid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionDirective {
    /// Avoid every edge terminating at `to_node`.
    IncomingNode { reason: FailureReason, to_node: NodeId },
    /// Avoid one directed channel traversal. `from_node` is absent when the
    /// edge leaves the route source.
    Edge {
        channel: ChannelId,
        reason: FailureReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_node: Option<NodeId>,
        to_node: NodeId,
    },
}

impl ExclusionDirective {
    pub fn reason(&self) -> &FailureReason {
        match self {
            Self::IncomingNode { reason, .. } | Self::Edge { reason, .. } => reason,
        }
    }

    pub fn to_node(&self) -> &NodeId {
        match self {
            Self::IncomingNode { to_node, .. } | Self::Edge { to_node, .. } => to_node,
        }
    }

    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Self::IncomingNode { .. } => None,
            Self::Edge { channel, .. } => Some(*channel),
        }
    }

    pub fn from_node(&self) -> Option<&NodeId> {
        match self {
            Self::IncomingNode { .. } => None,
            Self::Edge { from_node, .. } => from_node.as_ref(),
        }
    }
}

/// Output of one derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusions {
    pub exclusions: Vec<ExclusionDirective>,
}

impl Exclusions {
    pub fn is_empty(&self) -> bool {
        self.exclusions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exclusions.len()
    }

    /// Append unless an equivalent directive is already present.
    fn push(&mut self, directive: ExclusionDirective) {
        let duplicate = self.exclusions.iter().any(|existing| match (existing, &directive) {
            (ExclusionDirective::Edge { .. }, ExclusionDirective::Edge { .. }) => {
                existing.channel() == directive.channel() && existing.reason() == directive.reason()
            }
            _ => existing == &directive,
        });
        if !duplicate {
            self.exclusions.push(directive);
        }
    }
}

/// Failure reason to exclusion policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    rules: BTreeMap<FailureReason, ExclusionPolicy>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExclusionRules {
    /// The built-in table covering every known reason.
    pub fn builtin() -> Self {
        use ExclusionPolicy::*;
        use FailureReason::*;

        let table = [
            (UnknownPaymentHash, Terminal),
            (IncorrectPaymentAmount, Terminal),
            (FinalIncorrectCltvExpiry, Terminal),
            (FinalIncorrectHtlcAmount, Terminal),
            (FinalExpiryTooSoon, Terminal),
            (MppTimeout, Terminal),
            (IncorrectCltvExpiry, EdgeAndOriginNode),
            (ExpiryTooSoon, EdgeAndOriginNode),
            (TemporaryNodeFailure, EdgeAndOriginNode),
            (PermanentNodeFailure, EdgeAndOriginNode),
            (RequiredNodeFeatureMissing, EdgeAndOriginNode),
            (InvalidOnionVersion, EdgeAndOriginNode),
            (InvalidOnionHmac, EdgeAndOriginNode),
            (InvalidOnionKey, EdgeAndOriginNode),
            (InvalidOnionPayload, EdgeAndOriginNode),
            (UnknownNextPeer, AdjacentEdges),
            (TemporaryChannelFailure, EdgeOnly),
            (PermanentChannelFailure, EdgeOnly),
            (RequiredChannelFeatureMissing, EdgeOnly),
            (ChannelDisabled, EdgeOnly),
            (AmountBelowMinimum, EdgeOnly),
            (FeeInsufficient, EdgeOnly),
        ];

        Self {
            rules: table.into_iter().collect(),
        }
    }

    /// A table with no rules; every reason is unrecognized until set.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// The built-in table with configured overrides applied, minus the
    /// disabled reasons.
    pub fn from_config(config: &ExclusionConfig) -> Self {
        let mut rules = Self::builtin();
        for (reason, policy) in &config.rules {
            rules.set(reason.clone(), *policy);
        }
        for reason in &config.disabled {
            rules.remove(reason);
        }
        rules
    }

    pub fn set(&mut self, reason: FailureReason, policy: ExclusionPolicy) {
        self.rules.insert(reason, policy);
    }

    pub fn remove(&mut self, reason: &FailureReason) -> Option<ExclusionPolicy> {
        self.rules.remove(reason)
    }

    pub fn policy_for(&self, reason: &FailureReason) -> Option<ExclusionPolicy> {
        self.rules.get(reason).copied()
    }

    /// Known reasons with no policy, for operators to review.
    pub fn uncovered(&self) -> Vec<FailureReason> {
        FailureReason::KNOWN
            .iter()
            .filter(|reason| !self.rules.contains_key(*reason))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FailureReason, &ExclusionPolicy)> {
        self.rules.iter()
    }
}

/// Turns payment failure reports into exclusion directives.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMapper {
    rules: ExclusionRules,
}

impl ExclusionMapper {
    pub fn new(rules: ExclusionRules) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExclusionRules::builtin())
    }

    pub fn rules(&self) -> &ExclusionRules {
        &self.rules
    }

    /// Derive the graph elements to avoid after `report`.
    ///
    /// Directives are ordered pivot first: the failing edge, then whatever
    /// neighbours it. Pure and deterministic.
    pub fn derive_exclusions(&self, report: &FailureReport) -> Result<Exclusions, RoutingError> {
        self.derive_with_reason(report).map(|(_, out)| out)
    }

    /// Like [`derive_exclusions`](Self::derive_exclusions), also returning the
    /// validated failure reason.
    pub fn derive_with_reason(
        &self,
        report: &FailureReport,
    ) -> Result<(FailureReason, Exclusions), RoutingError> {
        let attempted = match report.attempted_hops.as_deref() {
            Some(hops) if !hops.is_empty() => hops,
            _ => return Err(RoutingError::MissingHops),
        };

        let hops = attempted
            .iter()
            .enumerate()
            .map(|(index, hop)| match (hop.channel, &hop.to_node) {
                (Some(channel), Some(node)) => Ok((channel, node)),
                _ => Err(RoutingError::MalformedHops { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let reporter = report
            .reporting_node
            .as_ref()
            .ok_or(RoutingError::MissingReportingNode)?;
        let reason = report.reason.as_ref().ok_or(RoutingError::MissingReason)?;

        let policy = self
            .rules
            .policy_for(reason)
            .filter(|_| reason.is_recognized())
            .ok_or_else(|| RoutingError::UnrecognizedReason {
                reason: reason.to_string(),
            })?;

        let mut out = Exclusions::default();

        let destination = hops[hops.len() - 1].1;
        if policy == ExclusionPolicy::Terminal && reporter == destination {
            tracing::debug!(%reason, "destination rejected on final-hop semantics");
            return Ok((reason.clone(), out));
        }

        let Some(failing) = report.failing_channel else {
            out.push(ExclusionDirective::IncomingNode {
                reason: reason.clone(),
                to_node: reporter.clone(),
            });
            tracing::debug!(%reason, reporter = reporter.short(), "excluding reporter");
            return Ok((reason.clone(), out));
        };

        let positions: Vec<usize> = hops
            .iter()
            .enumerate()
            .filter(|(_, (channel, _))| *channel == failing)
            .map(|(i, _)| i)
            .collect();
        let k = match positions.as_slice() {
            [] => return Err(RoutingError::FailingChannelNotInRoute { channel: failing }),
            [k] => *k,
            _ => return Err(RoutingError::AmbiguousFailingChannel { channel: failing }),
        };

        let edge = |i: usize| ExclusionDirective::Edge {
            channel: hops[i].0,
            reason: reason.clone(),
            from_node: i.checked_sub(1).map(|prev| hops[prev].1.clone()),
            to_node: hops[i].1.clone(),
        };

        out.push(edge(k));
        match policy {
            ExclusionPolicy::Terminal | ExclusionPolicy::EdgeAndOriginNode => {
                if let Some(prev) = k.checked_sub(1) {
                    out.push(ExclusionDirective::IncomingNode {
                        reason: reason.clone(),
                        to_node: hops[prev].1.clone(),
                    });
                }
            }
            ExclusionPolicy::AdjacentEdges => {
                if k + 1 < hops.len() {
                    out.push(edge(k + 1));
                }
            }
            ExclusionPolicy::EdgeOnly => {}
        }

        tracing::debug!(
            %reason,
            %policy,
            channel = %failing,
            position = k,
            count = out.len(),
            "derived exclusions"
        );
        Ok((reason.clone(), out))
    }
}

/// Derive exclusions with the built-in rule table.
pub fn derive_exclusions(report: &FailureReport) -> Result<Exclusions, RoutingError> {
    ExclusionMapper::with_defaults().derive_exclusions(report)
}
