//! Hopguard core: identifiers, amounts, confidence values, failure reasons,
//! and engine configuration shared by the routing and CLI crates.

pub mod config;
pub mod error;
pub mod reason;
pub mod types;

pub use config::{ConfidenceConfig, EngineConfig, ExclusionConfig, LoggingConfig, RetryConfig};
pub use error::CoreError;
pub use reason::{ExclusionPolicy, FailureReason};
pub use types::{ChannelId, Confidence, Millitokens, NodeId, CONFIDENCE_SCALE, NODE_KEY_LEN};
