use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Length in bytes of a compressed secp256k1 public key.
pub const NODE_KEY_LEN: usize = 33;

/// Confidence values are integers scaled to one million.
pub const CONFIDENCE_SCALE: u32 = 1_000_000;

/// Identity of a node in the channel graph: a compressed public key, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Parse a hex encoded compressed public key.
    pub fn from_hex(key: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(key)
            .map_err(|e| CoreError::InvalidNodeId(format!("{}: {}", key, e)))?;
        if bytes.len() != NODE_KEY_LEN {
            return Err(CoreError::InvalidNodeId(format!(
                "expected {} byte key, got {} bytes: {}",
                NODE_KEY_LEN,
                bytes.len(),
                key
            )));
        }
        Ok(Self(hex::encode(bytes)))
    }

    /// Build a node id from raw key bytes.
    pub fn from_bytes(bytes: [u8; NODE_KEY_LEN]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The lowercase hex form of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl TryFrom<String> for NodeId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl FromStr for NodeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short channel id in `BLOCKxTXxOUTPUT` notation, e.g. `"640000x1234x1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId {
    /// Height of the block containing the funding transaction.
    pub block: u32,
    /// Index of the funding transaction within the block.
    pub tx_index: u32,
    /// Funding output index.
    pub output_index: u16,
}

impl ChannelId {
    pub fn new(block: u32, tx_index: u32, output_index: u16) -> Self {
        Self {
            block,
            tx_index,
            output_index,
        }
    }
}

impl FromStr for ChannelId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 3 {
            return Err(CoreError::InvalidChannelId(format!(
                "expected BLOCKxTXxOUTPUT, got: {}",
                s
            )));
        }
        let invalid = |part: &str| CoreError::InvalidChannelId(format!("bad component {:?} in {}", part, s));
        Ok(Self {
            block: parts[0].parse().map_err(|_| invalid(parts[0]))?,
            tx_index: parts[1].parse().map_err(|_| invalid(parts[1]))?,
            output_index: parts[2].parse().map_err(|_| invalid(parts[2]))?,
        })
    }
}

impl TryFrom<String> for ChannelId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.block, self.tx_index, self.output_index)
    }
}

/// An amount in millitokens. Travels as a decimal string so that values
/// beyond 2^53 survive JSON consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Millitokens(pub u64);

impl Millitokens {
    pub const ZERO: Self = Self(0);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl FromStr for Millitokens {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| CoreError::InvalidAmount(format!("{:?}: {}", s, e)))
    }
}

impl fmt::Display for Millitokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Millitokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Millitokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self(n)),
        }
    }
}

/// Probability of success scaled to one million, always within `[0, 1_000_000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u64", into = "u32")]
pub struct Confidence(u32);

impl Confidence {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(CONFIDENCE_SCALE);

    /// Build a confidence value, clamping anything above one million.
    pub fn new(value: u64) -> Self {
        Self(value.min(CONFIDENCE_SCALE as u64) as u32)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The probability as a unit fraction, for display only.
    pub fn as_fraction(&self) -> f64 {
        self.0 as f64 / CONFIDENCE_SCALE as f64
    }

    /// Joint probability of two independent events, rounded half up:
    /// `round(self/1e6 * other/1e6 * 1e6)` computed in integers.
    pub fn combine(self, other: Confidence) -> Confidence {
        let scale = CONFIDENCE_SCALE as u64;
        let product = self.0 as u64 * other.0 as u64;
        Confidence::new((product + scale / 2) / scale)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<u64> for Confidence {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for u32 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
