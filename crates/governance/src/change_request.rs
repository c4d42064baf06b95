//! Change-request derivation.
//!
//! [`ChangeRequest::build`] flattens a [`ValidatedManifest`] plus the
//! pipeline's [`ReleaseContext`] into the tracker-agnostic record that gets
//! filed as a change issue, and renders its multi-section description.
//!
//! Building is total and deterministic: identical inputs give byte-identical
//! summary and description, with no timestamps or other ambient state mixed in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{RiskLevel, ValidatedManifest};

/// Release context supplied by the pipeline. Treated as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Git tag or other version identifier being released.
    pub git_tag: String,
    /// Environment being deployed to. Takes precedence over the manifest's.
    pub environment: String,
    /// Link to the pipeline run doing the deployment.
    pub pipeline_run_url: String,
}

/// Test statuses carried over from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub unit: String,
    pub integration: String,
    pub load: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

/// Canonical change request, ready to submit to an issue tracker.
///
/// Built once, submitted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// `[<service>] Deploy v<version> to <environment>`.
    pub summary: String,
    /// Multi-section human-readable description.
    pub description: String,
    pub service: String,
    pub environment: String,
    pub risk_level: RiskLevel,
    pub blast_radius: String,
    /// Impacted services joined with `", "`, in declared order.
    pub services_impacted: String,
    pub data_migration: bool,
    pub backward_compatible: bool,
    pub user_visible: bool,
    pub rollback_method: String,
    pub rollback_target_version: String,
    pub rollback_est_time_minutes: Option<u32>,
    pub rollback_data_restore_required: bool,
    pub team: String,
    pub slack_channel: String,
    pub git_tag: String,
    pub pipeline_run_url: String,
    /// Development tickets, split and trimmed. Empty when none were declared.
    pub dev_tickets: Vec<String>,
    pub tests: TestSummary,
}

impl ChangeRequest {
    /// Derives a change request from a validated manifest and release context.
    pub fn build(manifest: &ValidatedManifest, release: &ReleaseContext) -> Self {
        let dev_tickets = manifest
            .jira_ticket
            .as_deref()
            .map(parse_dev_tickets)
            .unwrap_or_default();

        Self {
            summary: format!(
                "[{}] Deploy v{} to {}",
                manifest.service, manifest.version, release.environment
            ),
            description: Description {
                manifest,
                release,
                dev_tickets: &dev_tickets,
            }
            .to_string(),
            service: manifest.service.clone(),
            environment: release.environment.clone(),
            risk_level: manifest.impact.risk_level,
            blast_radius: manifest.impact.blast_radius.clone(),
            services_impacted: manifest.impact.services_impacted.join(", "),
            data_migration: manifest.impact.data_migration,
            backward_compatible: manifest.impact.backward_compatible,
            user_visible: manifest.impact.user_visible,
            rollback_method: manifest.rollback.method.clone(),
            rollback_target_version: manifest.rollback.target_version.clone(),
            rollback_est_time_minutes: manifest.rollback.est_time_minutes,
            rollback_data_restore_required: manifest.rollback.data_restore_required,
            team: manifest.owner.team.clone(),
            slack_channel: manifest.owner.slack_channel.clone(),
            git_tag: release.git_tag.clone(),
            pipeline_run_url: release.pipeline_run_url.clone(),
            dev_tickets,
            tests: TestSummary {
                unit: manifest.tests.unit.clone(),
                integration: manifest.tests.integration.clone(),
                load: manifest.tests.load.clone(),
                report_url: manifest.tests.test_report_url.clone(),
            },
        }
    }
}

/// Splits a comma-separated ticket reference list, trimming entries and
/// dropping empty ones.
pub fn parse_dev_tickets(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// The human-readable description body. Rendered through `Display` so it
/// can be written to any formatter.
struct Description<'a> {
    manifest: &'a ValidatedManifest,
    release: &'a ReleaseContext,
    dev_tickets: &'a [String],
}

impl fmt::Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let manifest = self.manifest;
        let release = self.release;
        let impact = &manifest.impact;
        let tests = &manifest.tests;
        let rollback = &manifest.rollback;

        writeln!(f, "Deployment Summary: {}", manifest.summary)?;
        writeln!(f)?;
        writeln!(f, "Service: {}", manifest.service)?;
        writeln!(f, "Environment: {}", release.environment)?;
        writeln!(f, "Version/Tag: {}", release.git_tag)?;
        writeln!(f)?;

        writeln!(f, "Risk Assessment:")?;
        writeln!(f, "  Risk Level: {}", impact.risk_level)?;
        writeln!(f, "  Blast Radius: {}", impact.blast_radius)?;
        writeln!(f, "  Services Impacted: {}", impact.services_impacted.join(", "))?;
        writeln!(f, "  Data Migration: {}", yes_no(impact.data_migration))?;
        writeln!(f, "  Backward Compatible: {}", yes_no(impact.backward_compatible))?;
        writeln!(f, "  User Visible: {}", yes_no(impact.user_visible))?;
        writeln!(f)?;

        writeln!(f, "Tests:")?;
        writeln!(f, "  Unit: {}", tests.unit)?;
        writeln!(f, "  Integration: {}", tests.integration)?;
        writeln!(f, "  Load: {}", tests.load)?;
        if let Some(url) = &tests.test_report_url {
            writeln!(f, "  Test Report: {url}")?;
        }
        writeln!(f)?;

        writeln!(f, "Rollback Plan:")?;
        writeln!(f, "  Method: {}", rollback.method)?;
        writeln!(f, "  Target Version: {}", rollback.target_version)?;
        match rollback.est_time_minutes {
            Some(minutes) => writeln!(f, "  Estimated Time: {minutes} minutes")?,
            None => writeln!(f, "  Estimated Time: not specified")?,
        }
        writeln!(
            f,
            "  Data Restore Required: {}",
            yes_no(rollback.data_restore_required)
        )?;
        writeln!(f)?;

        writeln!(f, "Owner:")?;
        writeln!(f, "  Team: {}", manifest.owner.team)?;
        writeln!(f, "  Slack Channel: {}", manifest.owner.slack_channel)?;
        writeln!(f)?;

        writeln!(f, "GitHub:")?;
        write!(f, "  Workflow Run: {}", release.pipeline_run_url)?;
        match self.dev_tickets {
            [] => {}
            [single] => write!(f, "\n  Related Dev Ticket: {single}")?,
            many => {
                write!(f, "\n  Related Dev Tickets:")?;
                for ticket in many {
                    write!(f, "\n  - {ticket}")?;
                }
            }
        }
        Ok(())
    }
}
