//! Shared fixtures for the governance integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};

use governance::{validate, ReleaseContext, ValidatedManifest};

/// A complete, valid manifest document as the YAML decoder would produce it.
pub fn manifest_value() -> Value {
    json!({
        "service": "checkout",
        "version": "2.3.1",
        "environment": "production",
        "summary": "Add saved cards to checkout",
        "jira_ticket": "FO-1, FO-2",
        "change_type": "feature",
        "impact": {
            "user_visible": true,
            "blast_radius": "checkout flow only",
            "services_impacted": ["a", "b", "c"],
            "data_migration": false,
            "backward_compatible": true,
            "risk_level": "high"
        },
        "tests": {
            "unit": "passed",
            "integration": "passed",
            "load": "not run",
            "test_report_url": "https://ci.example.com/reports/812"
        },
        "rollback": {
            "method": "helm rollback",
            "target_version": "2.3.0",
            "est_time_minutes": 15,
            "data_restore_required": false
        },
        "owner": {
            "team": "payments",
            "slack_channel": "#payments-oncall"
        }
    })
}

pub fn validated() -> ValidatedManifest {
    validate(&manifest_value()).expect("fixture manifest is valid")
}

pub fn release() -> ReleaseContext {
    ReleaseContext {
        git_tag: "v2.3.1".to_string(),
        environment: "production".to_string(),
        pipeline_run_url: "https://github.com/acme/checkout/actions/runs/42".to_string(),
    }
}
