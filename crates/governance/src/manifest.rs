//! Deployment manifest model and validation.
//!
//! A manifest is the release's own declaration of risk, tests, rollback, and
//! ownership. It arrives here already decoded into a generic
//! [`serde_json::Value`] mapping; reading and parsing the file is the
//! caller's job.
//!
//! [`validate`] is the only way to obtain a [`ValidatedManifest`], and a
//! [`ValidatedManifest`] is the only thing
//! [`ChangeRequest::build`](crate::ChangeRequest::build) accepts. Every block
//! the description renders is therefore guaranteed present by construction.

use std::ops::Deref;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{RiskLevel, ValidationError};

/// Top-level fields that must be present and non-null, in the order they are
/// checked. The first one missing is the one reported.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "service",
    "version",
    "environment",
    "summary",
    "change_type",
    "impact",
    "tests",
    "rollback",
    "owner",
];

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Source-of-truth release declaration, normally `.techops/deployment.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// Service being released.
    pub service: String,

    /// Release version. Any YAML scalar is accepted so `version: 1.0` does not
    /// fail to decode.
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,

    /// Environment the manifest was written for. The change request uses the
    /// pipeline-supplied environment instead.
    pub environment: String,

    /// One-line human summary of the change.
    pub summary: String,

    /// Development ticket reference(s), single or comma-separated
    /// (`"FO-1234"` or `"FO-1234, FO-5678"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_ticket: Option<String>,

    /// Free-form change classification (e.g. `"feature"`, `"hotfix"`).
    pub change_type: String,

    /// Risk and impact assessment.
    pub impact: Impact,

    /// Test evidence.
    pub tests: Tests,

    /// Rollback plan.
    pub rollback: Rollback,

    /// Owning team.
    pub owner: Owner,
}

/// Risk and impact block of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    /// Whether end users will notice the change.
    pub user_visible: bool,
    /// Free-text description of how far a failure would spread.
    pub blast_radius: String,
    /// Services affected by the change, in declared order. Duplicates are kept.
    pub services_impacted: Vec<String>,
    /// Whether the release runs a data migration.
    pub data_migration: bool,
    /// Whether the release can run alongside the previous version.
    pub backward_compatible: bool,
    /// Declared risk; drives the approval gate.
    pub risk_level: RiskLevel,
}

/// Test evidence block of a manifest. Statuses are free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tests {
    #[serde(deserialize_with = "scalar_string")]
    pub unit: String,
    #[serde(deserialize_with = "scalar_string")]
    pub integration: String,
    #[serde(deserialize_with = "scalar_string")]
    pub load: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_report_url: Option<String>,
}

/// Rollback plan block of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rollback {
    /// How the rollback is performed (e.g. `"helm rollback"`).
    pub method: String,
    /// Version a rollback returns to.
    #[serde(deserialize_with = "scalar_string")]
    pub target_version: String,
    /// Estimated rollback duration. Absent when the team did not estimate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_time_minutes: Option<u32>,
    /// Whether rolling back requires restoring data.
    pub data_restore_required: bool,
}

/// Ownership block of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub team: String,
    pub slack_channel: String,
}

/// A manifest that passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedManifest(DeploymentManifest);

impl ValidatedManifest {
    /// Returns the validated manifest.
    pub fn manifest(&self) -> &DeploymentManifest {
        &self.0
    }

    /// Consumes the wrapper and returns the manifest.
    pub fn into_inner(self) -> DeploymentManifest {
        self.0
    }
}

impl Deref for ValidatedManifest {
    type Target = DeploymentManifest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a decoded manifest document.
///
/// Checks, in order: the document is a mapping; every field in
/// [`REQUIRED_FIELDS`] is present and non-null; `impact` is a mapping with a
/// `risk_level` in {low, medium, high}; the whole document decodes into
/// [`DeploymentManifest`]. Nothing is defaulted; optional fields that are
/// absent stay `None`.
pub fn validate(raw: &Value) -> Result<ValidatedManifest, ValidationError> {
    let map = raw.as_object().ok_or_else(|| ValidationError::NotAMapping {
        found: value_kind(raw).to_string(),
    })?;

    if let Some(field) = REQUIRED_FIELDS
        .iter()
        .find(|field| map.get(**field).map_or(true, Value::is_null))
    {
        return Err(ValidationError::MissingField {
            field: (*field).to_string(),
        });
    }

    let impact = map
        .get("impact")
        .and_then(Value::as_object)
        .ok_or_else(|| ValidationError::Malformed {
            message: "impact must be a mapping".to_string(),
        })?;

    match impact.get("risk_level") {
        None | Some(Value::Null) => {
            return Err(ValidationError::MissingField {
                field: "impact.risk_level".to_string(),
            })
        }
        Some(Value::String(s)) if s.parse::<RiskLevel>().is_ok() => {}
        Some(other) => {
            let value = match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            };
            return Err(ValidationError::InvalidRiskLevel {
                value,
                allowed: RiskLevel::ALL.iter().map(|r| r.to_string()).collect(),
            });
        }
    }

    let manifest: DeploymentManifest =
        serde_json::from_value(raw.clone()).map_err(|e| ValidationError::Malformed {
            message: e.to_string(),
        })?;

    debug!(
        service = %manifest.service,
        version = %manifest.version,
        risk_level = %manifest.impact.risk_level,
        "deployment manifest validated"
    );

    Ok(ValidatedManifest(manifest))
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

/// Accepts any scalar and keeps its textual form.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string, found {}",
            value_kind(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "service": "checkout",
            "version": "2.3.1",
            "environment": "production",
            "summary": "Add saved cards",
            "change_type": "feature",
            "impact": {
                "user_visible": true,
                "blast_radius": "checkout only",
                "services_impacted": ["checkout", "payments"],
                "data_migration": false,
                "backward_compatible": true,
                "risk_level": "medium"
            },
            "tests": { "unit": "passed", "integration": "passed", "load": "skipped" },
            "rollback": {
                "method": "helm rollback",
                "target_version": "2.3.0",
                "est_time_minutes": 10,
                "data_restore_required": false
            },
            "owner": { "team": "payments", "slack_channel": "#payments" }
        })
    }

    #[test]
    fn accepts_a_complete_manifest() {
        let validated = validate(&sample()).unwrap();
        assert_eq!(validated.service, "checkout");
        assert_eq!(validated.impact.risk_level, RiskLevel::Medium);
        assert_eq!(validated.jira_ticket, None);
        assert_eq!(validated.tests.test_report_url, None);
    }

    #[test]
    fn null_counts_as_missing() {
        let mut raw = sample();
        raw["summary"] = Value::Null;
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField {
                field: "summary".to_string()
            }
        );
    }

    #[test]
    fn reports_the_first_missing_field_in_check_order() {
        let mut raw = sample();
        let map = raw.as_object_mut().unwrap();
        map.remove("owner");
        map.remove("version");
        assert_eq!(
            validate(&raw).unwrap_err(),
            ValidationError::MissingField {
                field: "version".to_string()
            }
        );
    }

    #[test]
    fn numeric_versions_keep_their_text() {
        let mut raw = sample();
        raw["version"] = json!(3);
        raw["rollback"]["target_version"] = json!(2);
        let validated = validate(&raw).unwrap();
        assert_eq!(validated.version, "3");
        assert_eq!(validated.rollback.target_version, "2");
    }

    #[test]
    fn non_string_risk_level_is_invalid() {
        let mut raw = sample();
        raw["impact"]["risk_level"] = json!(3);
        match validate(&raw).unwrap_err() {
            ValidationError::InvalidRiskLevel { value, .. } => assert_eq!(value, "3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scalar_list_is_not_a_mapping() {
        let err = validate(&json!(["service"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAMapping {
                found: "array".to_string()
            }
        );
    }
}
