//! Reads a deployment manifest file into a generic mapping.
//!
//! Decoding is YAML; JSON documents are valid YAML and load the same way.
//! Validation is left to [`governance::validate`].

use std::path::Path;

use anyhow::{bail, Context};
use serde_json::Value;

pub async fn load(path: &Path) -> anyhow::Result<Value> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!("Deployment manifest not found: {}", path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse deployment manifest {}", path.display()))
}
