//! `releaselens verify-approval`: gate a production deploy on the change's
//! risk level and approval status.

use std::io::Write;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use governance::{ApprovalGate, IssueTracker, RiskLevel, UnknownRiskPolicy};

use super::change_key;

#[derive(Debug, Args)]
pub struct VerifyApprovalArgs {
    /// Key of the change issue.
    #[arg(long, env = "CHANGE_KEY")]
    pub change_key: Option<String>,

    /// Treat the change as at least this risky, whatever was recorded.
    #[arg(long)]
    pub required_risk: Option<RiskLevel>,

    /// Let a change with an unrecognised risk level through (with a warning).
    #[arg(long)]
    pub allow_unknown_risk: bool,
}

impl VerifyApprovalArgs {
    fn gate(&self) -> ApprovalGate {
        let mut gate = ApprovalGate::new();
        if let Some(floor) = self.required_risk {
            gate = gate.with_minimum_risk(floor);
        }
        if self.allow_unknown_risk {
            gate = gate.with_unknown_risk_policy(UnknownRiskPolicy::Warn);
        }
        gate
    }
}

/// Evaluates the gate for the issue and reports the result. Returns whether
/// promotion is permitted.
pub async fn run(
    tracker: &dyn IssueTracker,
    args: &VerifyApprovalArgs,
    risk_field: &str,
    outputs: &crate::outputs::PipelineOutputs,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let key = change_key(args.change_key.as_deref())?;

    let issue = tracker
        .get_issue(&key)
        .await
        .with_context(|| format!("Failed to fetch {key}"))?;
    let risk_level = issue.custom_field(risk_field).unwrap_or_default().to_string();
    info!(key = %key, status = %issue.status, risk_level = %risk_level, "fetched change issue");

    let decision = args.gate().evaluate(&issue.status, &risk_level);
    if decision.is_warning() {
        warn!(key = %key, reason = %decision.reason, permitted = decision.permitted, "approval check needs attention");
    } else if decision.permitted {
        info!(key = %key, reason = %decision.reason, "change may proceed to production");
    } else {
        warn!(key = %key, reason = %decision.reason, "change is not approved for production");
    }

    outputs
        .export(&[
            ("risk_level", risk_level.clone()),
            ("status", issue.status.clone()),
            ("approved", decision.is_approved().to_string()),
        ])
        .await?;

    writeln!(out, "APPROVED={}", decision.is_approved())?;
    writeln!(out, "REASON={}", decision.reason)?;
    Ok(decision.permitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::FakeTracker;
    use crate::outputs::PipelineOutputs;

    const RISK: &str = "customfield_10003";

    fn args(key: &str) -> VerifyApprovalArgs {
        VerifyApprovalArgs {
            change_key: Some(key.to_string()),
            required_risk: None,
            allow_unknown_risk: false,
        }
    }

    async fn verify(tracker: &FakeTracker, args: &VerifyApprovalArgs) -> (bool, String) {
        let mut out = Vec::new();
        let permitted = run(tracker, args, RISK, &PipelineOutputs::default(), &mut out)
            .await
            .unwrap();
        (permitted, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn low_risk_passes_in_any_status() {
        let tracker = FakeTracker::default().with_issue("CHG-1", "Draft", &[(RISK, "low")]);
        let (permitted, out) = verify(&tracker, &args("CHG-1")).await;
        assert!(permitted);
        assert_eq!(out, "APPROVED=true\nREASON=auto-approved: low risk\n");
    }

    #[tokio::test]
    async fn high_risk_needs_approved_status() {
        let tracker = FakeTracker::default()
            .with_issue("CHG-1", "Awaiting TechOps Approval", &[(RISK, "high")]);
        let (permitted, out) = verify(&tracker, &args("CHG-1")).await;
        assert!(!permitted);
        assert!(out.contains("Approved for Prod"));
        assert!(out.contains("Awaiting TechOps Approval"));

        let tracker =
            FakeTracker::default().with_issue("CHG-2", "Approved for Prod", &[(RISK, "high")]);
        assert!(verify(&tracker, &args("CHG-2")).await.0);
    }

    #[tokio::test]
    async fn missing_risk_field_is_unknown_and_blocks() {
        let tracker = FakeTracker::default().with_issue("CHG-1", "Approved for Prod", &[]);
        let (permitted, out) = verify(&tracker, &args("CHG-1")).await;
        assert!(!permitted);
        assert!(out.contains("unknown risk level"));
    }

    #[tokio::test]
    async fn allow_unknown_risk_lets_it_through() {
        let tracker = FakeTracker::default().with_issue("CHG-1", "Draft", &[(RISK, "bogus")]);
        let mut a = args("CHG-1");
        a.allow_unknown_risk = true;
        assert!(verify(&tracker, &a).await.0);
    }

    #[tokio::test]
    async fn unknown_risk_let_through_is_not_exported_as_approved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        let tracker = FakeTracker::default().with_issue("CHG-1", "Draft", &[(RISK, "bogus")]);
        let mut a = args("CHG-1");
        a.allow_unknown_risk = true;
        let mut out = Vec::new();

        let permitted = run(&tracker, &a, RISK, &PipelineOutputs::to_file(&path), &mut out)
            .await
            .unwrap();

        assert!(permitted);
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "risk_level=bogus\nstatus=Draft\napproved=false\n"
        );
        assert!(String::from_utf8(out).unwrap().starts_with("APPROVED=false\n"));
    }

    #[tokio::test]
    async fn required_risk_raises_low_risk_changes() {
        let tracker = FakeTracker::default().with_issue("CHG-1", "In Staging", &[(RISK, "low")]);
        let mut a = args("CHG-1");
        a.required_risk = Some(RiskLevel::Medium);
        assert!(!verify(&tracker, &a).await.0);
    }

    #[tokio::test]
    async fn exports_step_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        let tracker = FakeTracker::default().with_issue("CHG-1", "Draft", &[(RISK, "medium")]);
        let mut out = Vec::new();

        run(&tracker, &args("CHG-1"), RISK, &PipelineOutputs::to_file(&path), &mut out)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "risk_level=medium\nstatus=Draft\napproved=false\n"
        );
    }
}
