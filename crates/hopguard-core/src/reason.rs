use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Reason code attached to a failed payment attempt.
///
/// This enumeration is the dispatch key for failure-to-exclusion rules, so
/// variant names are part of the external contract. Codes outside the known
/// set decode to [`FailureReason::Unrecognized`] instead of failing, which
/// lets the exclusion mapper report them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureReason {
    UnknownPaymentHash,
    IncorrectPaymentAmount,
    FinalIncorrectCltvExpiry,
    FinalIncorrectHtlcAmount,
    FinalExpiryTooSoon,
    MppTimeout,
    IncorrectCltvExpiry,
    ExpiryTooSoon,
    TemporaryNodeFailure,
    PermanentNodeFailure,
    RequiredNodeFeatureMissing,
    InvalidOnionVersion,
    InvalidOnionHmac,
    InvalidOnionKey,
    InvalidOnionPayload,
    UnknownNextPeer,
    TemporaryChannelFailure,
    PermanentChannelFailure,
    RequiredChannelFeatureMissing,
    ChannelDisabled,
    AmountBelowMinimum,
    FeeInsufficient,
    /// A code this build does not know about.
    Unrecognized(String),
}

impl FailureReason {
    /// Every known reason, in declaration order.
    pub const KNOWN: [FailureReason; 22] = [
        Self::UnknownPaymentHash,
        Self::IncorrectPaymentAmount,
        Self::FinalIncorrectCltvExpiry,
        Self::FinalIncorrectHtlcAmount,
        Self::FinalExpiryTooSoon,
        Self::MppTimeout,
        Self::IncorrectCltvExpiry,
        Self::ExpiryTooSoon,
        Self::TemporaryNodeFailure,
        Self::PermanentNodeFailure,
        Self::RequiredNodeFeatureMissing,
        Self::InvalidOnionVersion,
        Self::InvalidOnionHmac,
        Self::InvalidOnionKey,
        Self::InvalidOnionPayload,
        Self::UnknownNextPeer,
        Self::TemporaryChannelFailure,
        Self::PermanentChannelFailure,
        Self::RequiredChannelFeatureMissing,
        Self::ChannelDisabled,
        Self::AmountBelowMinimum,
        Self::FeeInsufficient,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::UnknownPaymentHash => "UnknownPaymentHash",
            Self::IncorrectPaymentAmount => "IncorrectPaymentAmount",
            Self::FinalIncorrectCltvExpiry => "FinalIncorrectCltvExpiry",
            Self::FinalIncorrectHtlcAmount => "FinalIncorrectHtlcAmount",
            Self::FinalExpiryTooSoon => "FinalExpiryTooSoon",
            Self::MppTimeout => "MppTimeout",
            Self::IncorrectCltvExpiry => "IncorrectCltvExpiry",
            Self::ExpiryTooSoon => "ExpiryTooSoon",
            Self::TemporaryNodeFailure => "TemporaryNodeFailure",
            Self::PermanentNodeFailure => "PermanentNodeFailure",
            Self::RequiredNodeFeatureMissing => "RequiredNodeFeatureMissing",
            Self::InvalidOnionVersion => "InvalidOnionVersion",
            Self::InvalidOnionHmac => "InvalidOnionHmac",
            Self::InvalidOnionKey => "InvalidOnionKey",
            Self::InvalidOnionPayload => "InvalidOnionPayload",
            Self::UnknownNextPeer => "UnknownNextPeer",
            Self::TemporaryChannelFailure => "TemporaryChannelFailure",
            Self::PermanentChannelFailure => "PermanentChannelFailure",
            Self::RequiredChannelFeatureMissing => "RequiredChannelFeatureMissing",
            Self::ChannelDisabled => "ChannelDisabled",
            Self::AmountBelowMinimum => "AmountBelowMinimum",
            Self::FeeInsufficient => "FeeInsufficient",
            Self::Unrecognized(code) => code,
        }
    }

    /// Decode a reason code; unknown codes map to [`FailureReason::Unrecognized`].
    pub fn from_code(code: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == code)
            .cloned()
            .unwrap_or_else(|| Self::Unrecognized(code.to_string()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl FromStr for FailureReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_code(s))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FailureReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FailureReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}

/// How a failure reason translates into graph exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionPolicy {
    /// The destination rejected on final-hop semantics; the route itself worked.
    Terminal,
    /// Block the failing edge and every inbound path to the node it leaves from.
    EdgeAndOriginNode,
    /// The origin node does not know its next peer: block the edge into the
    /// origin and the edge out of it.
    AdjacentEdges,
    /// Block the failing edge only.
    EdgeOnly,
}

impl fmt::Display for ExclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Terminal => "terminal",
            Self::EdgeAndOriginNode => "edge_and_origin_node",
            Self::AdjacentEdges => "adjacent_edges",
            Self::EdgeOnly => "edge_only",
        };
        f.write_str(name)
    }
}
