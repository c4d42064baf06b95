//! `releaselens create-change`: validate the manifest and file a change issue.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;
use tracing::info;

use governance::{
    validate, ChangeRequest, CreatedIssue, IssueKey, IssueTracker, ReleaseContext, ValidatedManifest,
};

use crate::manifest_source;
use crate::outputs::PipelineOutputs;

/// Placeholder recorded when no pipeline-run URL can be determined.
const NO_RUN_URL: &str = "N/A";

#[derive(Debug, Args)]
pub struct CreateChangeArgs {
    /// Path to the deployment manifest.
    #[arg(long, default_value = ".techops/deployment.yaml")]
    pub manifest: PathBuf,

    /// Git tag being released.
    #[arg(long, env = "GITHUB_REF_NAME")]
    pub tag: Option<String>,

    /// Environment being deployed to.
    #[arg(long, default_value = "staging")]
    pub environment: String,

    /// Link to the pipeline run. Derived from GITHUB_SERVER_URL,
    /// GITHUB_REPOSITORY and GITHUB_RUN_ID when omitted.
    #[arg(long)]
    pub github_run_url: Option<String>,

    /// Print the summary and description instead of filing the issue.
    #[arg(long)]
    pub dry_run: bool,
}

/// A validated manifest and the change request derived from it.
#[derive(Debug)]
pub struct PreparedChange {
    pub manifest: ValidatedManifest,
    pub request: ChangeRequest,
}

/// Loads, validates, and converts the manifest. No tracker calls.
pub async fn prepare(
    args: &CreateChangeArgs,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<PreparedChange> {
    let git_tag = args
        .tag
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!("Git tag is required. Use --tag or set GITHUB_REF_NAME environment variable."))?;
    let pipeline_run_url = args
        .github_run_url
        .clone()
        .or_else(|| github_run_url(&env))
        .unwrap_or_else(|| NO_RUN_URL.to_string());

    info!(
        manifest = %args.manifest.display(),
        git_tag = %git_tag,
        environment = %args.environment,
        pipeline_run_url = %pipeline_run_url,
        "preparing change request"
    );

    let raw = manifest_source::load(&args.manifest).await?;
    let manifest = validate(&raw)
        .with_context(|| format!("Invalid deployment manifest {}", args.manifest.display()))?;
    info!(
        service = %manifest.service,
        version = %manifest.version,
        risk_level = %manifest.impact.risk_level,
        "parsed deployment manifest"
    );

    let release = ReleaseContext {
        git_tag,
        environment: args.environment.clone(),
        pipeline_run_url,
    };
    let request = ChangeRequest::build(&manifest, &release);
    Ok(PreparedChange { manifest, request })
}

/// Builds the Actions run URL from the standard `GITHUB_*` variables.
fn github_run_url(env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let server = env("GITHUB_SERVER_URL")?;
    let repository = env("GITHUB_REPOSITORY")?;
    let run_id = env("GITHUB_RUN_ID")?;
    Some(format!("{server}/{repository}/actions/runs/{run_id}"))
}

/// Prints the summary and description that would be filed.
pub fn print_dry_run(prepared: &PreparedChange, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "Summary: {}", prepared.request.summary)?;
    writeln!(out)?;
    writeln!(out, "{}", prepared.request.description)?;
    Ok(())
}

/// Files the change issue and reports its key and link.
pub async fn submit(
    tracker: &dyn IssueTracker,
    prepared: &PreparedChange,
    browse_url: impl FnOnce(&IssueKey) -> String,
    outputs: &PipelineOutputs,
    out: &mut impl Write,
) -> anyhow::Result<CreatedIssue> {
    let created = tracker
        .create_issue(&prepared.request)
        .await
        .context("Failed to create change issue")?;
    let change_url = browse_url(&created.key);
    info!(key = %created.key, url = %change_url, "created change issue");

    let manifest = &prepared.manifest;
    let risk_level = manifest.impact.risk_level.to_string();
    outputs
        .export(&[
            ("change_key", created.key.to_string()),
            ("risk_level", risk_level.clone()),
            ("service", manifest.service.clone()),
            ("version", manifest.version.clone()),
        ])
        .await?;

    writeln!(out, "CHANGE_KEY={}", created.key)?;
    writeln!(out, "RISK_LEVEL={risk_level}")?;
    writeln!(out, "CHANGE_URL={change_url}")?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::commands::fake::FakeTracker;

    const MANIFEST: &str = "\
service: checkout
version: 2.3.1
environment: production
summary: Add saved cards
jira_ticket: FO-1
change_type: feature
impact:
  user_visible: true
  blast_radius: checkout only
  services_impacted: [checkout, payments]
  data_migration: false
  backward_compatible: true
  risk_level: high
tests:
  unit: passed
  integration: passed
  load: skipped
rollback:
  method: helm rollback
  target_version: 2.3.0
  est_time_minutes: 10
  data_restore_required: false
owner:
  team: payments
  slack_channel: '#payments'
";

    fn args(dir: &tempfile::TempDir, body: &str) -> CreateChangeArgs {
        let manifest = dir.path().join("deployment.yaml");
        std::fs::write(&manifest, body).unwrap();
        CreateChangeArgs {
            manifest,
            tag: Some("v2.3.1".to_string()),
            environment: "production".to_string(),
            github_run_url: None,
            dry_run: false,
        }
    }

    fn github_env() -> impl Fn(&str) -> Option<String> {
        let env = HashMap::from([
            ("GITHUB_SERVER_URL", "https://github.com"),
            ("GITHUB_REPOSITORY", "acme/checkout"),
            ("GITHUB_RUN_ID", "42"),
        ]);
        move |k: &str| env.get(k).map(|v| v.to_string())
    }

    #[tokio::test]
    async fn prepare_derives_the_run_url_from_github_variables() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = prepare(&args(&dir, MANIFEST), github_env()).await.unwrap();
        assert_eq!(
            prepared.request.pipeline_run_url,
            "https://github.com/acme/checkout/actions/runs/42"
        );
        assert_eq!(prepared.request.summary, "[checkout] Deploy v2.3.1 to production");
    }

    #[tokio::test]
    async fn prepare_falls_back_to_placeholder_run_url() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = prepare(&args(&dir, MANIFEST), |_| None).await.unwrap();
        assert_eq!(prepared.request.pipeline_run_url, "N/A");
    }

    #[tokio::test]
    async fn explicit_run_url_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(&dir, MANIFEST);
        a.github_run_url = Some("https://ci.example.com/1".to_string());
        let prepared = prepare(&a, github_env()).await.unwrap();
        assert_eq!(prepared.request.pipeline_run_url, "https://ci.example.com/1");
    }

    #[tokio::test]
    async fn missing_tag_is_rejected_before_reading_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args(&dir, MANIFEST);
        a.tag = None;
        a.manifest = dir.path().join("absent.yaml");
        let err = prepare(&a, |_| None).await.unwrap_err();
        assert!(err.to_string().starts_with("Git tag is required"));
    }

    #[tokio::test]
    async fn invalid_manifest_surfaces_the_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let body = MANIFEST.replace("risk_level: high", "risk_level: extreme");
        let err = prepare(&args(&dir, &body), |_| None).await.unwrap_err();
        let root = err.root_cause().to_string();
        assert_eq!(root, "Invalid risk_level: extreme. Must be one of: low, medium, high");
    }

    #[tokio::test]
    async fn submit_files_the_issue_and_exports_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = prepare(&args(&dir, MANIFEST), |_| None).await.unwrap();
        let tracker = FakeTracker::default();
        let output_file = dir.path().join("github_output");
        let outputs = PipelineOutputs::to_file(&output_file);
        let mut stdout = Vec::new();

        let created = submit(
            &tracker,
            &prepared,
            |key| format!("https://acme.atlassian.net/browse/{key}"),
            &outputs,
            &mut stdout,
        )
        .await
        .unwrap();

        assert_eq!(created.key.as_str(), "CHG-1");
        assert_eq!(tracker.created()[0].summary, prepared.request.summary);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "CHANGE_KEY=CHG-1\nRISK_LEVEL=high\nCHANGE_URL=https://acme.atlassian.net/browse/CHG-1\n"
        );
        assert_eq!(
            std::fs::read_to_string(output_file).unwrap(),
            "change_key=CHG-1\nrisk_level=high\nservice=checkout\nversion=2.3.1\n"
        );
    }

    #[tokio::test]
    async fn dry_run_prints_summary_and_description() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = prepare(&args(&dir, MANIFEST), |_| None).await.unwrap();
        let mut stdout = Vec::new();
        print_dry_run(&prepared, &mut stdout).unwrap();

        let text = String::from_utf8(stdout).unwrap();
        assert_eq!(
            text,
            format!(
                "Summary: [checkout] Deploy v2.3.1 to production\n\n{}\n",
                prepared.request.description
            )
        );
        assert!(text.contains("\nDeployment Summary: Add saved cards\n"));
        assert!(text.ends_with("  Related Dev Ticket: FO-1\n"));
    }
}
