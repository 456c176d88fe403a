pub mod confidence;
pub mod exclusions;
pub mod init;
pub mod rules;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Read and decode a JSON input document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("decoding {}", path.display()))
}
