//! Step outputs for GitHub Actions.
//!
//! When `GITHUB_OUTPUT` names a file, `key=value` lines are appended to it so
//! later workflow steps can read them as `steps.<id>.outputs.<key>`. Outside
//! Actions the writer is a no-op.

use std::path::PathBuf;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Destination for step outputs.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutputs {
    path: Option<PathBuf>,
}

impl PipelineOutputs {
    /// Reads the destination from `GITHUB_OUTPUT`.
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os("GITHUB_OUTPUT")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }

    #[cfg(test)]
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Appends `pairs` as `key=value` lines. Returns whether anything was
    /// written.
    pub async fn export(&self, pairs: &[(&str, String)]) -> anyhow::Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let mut text = String::new();
        for (key, value) in pairs {
            text.push_str(key);
            text.push('=');
            text.push_str(value);
            text.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open GITHUB_OUTPUT file {}", path.display()))?;
        file.write_all(text.as_bytes())
            .await
            .with_context(|| format!("Failed to write GITHUB_OUTPUT file {}", path.display()))?;
        file.flush().await?;

        debug!(path = %path.display(), count = pairs.len(), "exported step outputs");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        let outputs = PipelineOutputs::to_file(&path);
        let wrote = outputs
            .export(&[("change_key", "CHG-1".to_string()), ("risk_level", "low".to_string())])
            .await
            .unwrap();

        assert!(wrote);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=1\nchange_key=CHG-1\nrisk_level=low\n"
        );
    }

    #[tokio::test]
    async fn without_a_destination_nothing_is_written() {
        let outputs = PipelineOutputs::default();
        assert!(!outputs.export(&[("a", "b".to_string())]).await.unwrap());
    }
}
