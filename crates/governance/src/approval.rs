//! Risk levels and the production approval gate.
//!
//! The gate is a decision table over `(risk level, current status)`:
//!
//! | Risk | Status | Decision |
//! |------|--------|----------|
//! | low | any | permitted, auto-approved |
//! | medium / high | `Approved for Prod` | permitted, approved by reviewer |
//! | medium / high | anything else | blocked, awaiting approval |
//! | unrecognised | any | blocked (or permitted with a warning under [`UnknownRiskPolicy::Warn`]) |
//!
//! Evaluation never fails. An unrecognised risk value is an
//! [`ApprovalBasis::UnknownRisk`] decision, so the pipeline can still export
//! its outputs before exiting non-zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::WorkflowState;

/// Status a medium or high risk change must be in before production.
pub const APPROVED_STATUS: &str = WorkflowState::ApprovedForProd.as_str();

// ---------------------------------------------------------------------------
// Risk level
// ---------------------------------------------------------------------------

/// Declared risk of a change. Ordered from least to most risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Every risk level, in ascending order.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Returns the manifest spelling of this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Whether a change at this level needs a reviewer before production.
    pub fn requires_review(self) -> bool {
        self > RiskLevel::Low
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Exact, case-sensitive match against `low`, `medium`, `high`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskLevel::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Invalid risk level: {s}. Must be one of: low, medium, high"))
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Why the gate decided the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalBasis {
    /// Low risk; no review needed.
    AutoApproved,
    /// Medium or high risk and the issue is in [`APPROVED_STATUS`].
    ReviewerApproved,
    /// Medium or high risk and the issue is not yet approved.
    AwaitingApproval {
        /// The status the issue must reach.
        required: String,
        /// The status the issue is actually in.
        actual: String,
    },
    /// The recorded risk level is not one the gate recognises.
    UnknownRisk {
        /// The value as recorded on the issue.
        value: String,
    },
}

/// Outcome of an approval check. Recomputed on every check, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether production promotion may proceed.
    pub permitted: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Tagged form of the explanation, for callers that branch on it.
    pub basis: ApprovalBasis,
}

impl ApprovalDecision {
    /// Whether this decision should be surfaced as a warning rather than a
    /// plain pass/fail.
    pub fn is_warning(&self) -> bool {
        matches!(self.basis, ApprovalBasis::UnknownRisk { .. })
    }

    /// Whether the change is actually approved: low risk, or signed off by a
    /// reviewer. A change let through under [`UnknownRiskPolicy::Warn`] is
    /// permitted but not approved.
    pub fn is_approved(&self) -> bool {
        matches!(
            self.basis,
            ApprovalBasis::AutoApproved | ApprovalBasis::ReviewerApproved
        )
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// What to do when the recorded risk level is not recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRiskPolicy {
    /// Block promotion.
    #[default]
    Block,
    /// Permit promotion, reporting the unknown risk as a warning.
    Warn,
}

/// The risk-based production approval policy.
///
/// The default gate blocks unknown risk levels and applies no minimum risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalGate {
    unknown_risk: UnknownRiskPolicy,
    minimum_risk: Option<RiskLevel>,
}

impl ApprovalGate {
    /// Creates a gate with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how unrecognised risk levels are treated.
    pub fn with_unknown_risk_policy(mut self, policy: UnknownRiskPolicy) -> Self {
        self.unknown_risk = policy;
        self
    }

    /// Treats every recognised risk level as at least `floor`.
    ///
    /// Lets a pipeline require review for a change the manifest declared as
    /// low risk. Unrecognised values are left as they are.
    pub fn with_minimum_risk(mut self, floor: RiskLevel) -> Self {
        self.minimum_risk = Some(floor);
        self
    }

    /// Decides whether an issue in `current_status` with the recorded
    /// `risk_level` may be promoted to production.
    pub fn evaluate(&self, current_status: &str, risk_level: &str) -> ApprovalDecision {
        let risk = match risk_level.parse::<RiskLevel>() {
            Ok(risk) => self.minimum_risk.map_or(risk, |floor| risk.max(floor)),
            Err(_) => return self.unknown(risk_level),
        };

        if !risk.requires_review() {
            return ApprovalDecision {
                permitted: true,
                reason: "auto-approved: low risk".to_string(),
                basis: ApprovalBasis::AutoApproved,
            };
        }

        if current_status == APPROVED_STATUS {
            ApprovalDecision {
                permitted: true,
                reason: "approved by reviewer".to_string(),
                basis: ApprovalBasis::ReviewerApproved,
            }
        } else {
            ApprovalDecision {
                permitted: false,
                reason: format!(
                    "{risk} risk changes require TechOps approval: expected status \
                     \"{APPROVED_STATUS}\", current status \"{current_status}\""
                ),
                basis: ApprovalBasis::AwaitingApproval {
                    required: APPROVED_STATUS.to_string(),
                    actual: current_status.to_string(),
                },
            }
        }
    }

    fn unknown(&self, value: &str) -> ApprovalDecision {
        let permitted = self.unknown_risk == UnknownRiskPolicy::Warn;
        warn!(risk_level = %value, permitted, "unknown risk level");
        ApprovalDecision {
            permitted,
            reason: format!("unknown risk level \"{value}\""),
            basis: ApprovalBasis::UnknownRisk {
                value: value.to_string(),
            },
        }
    }
}

/// Evaluates with the default [`ApprovalGate`].
pub fn evaluate(current_status: &str, risk_level: &str) -> ApprovalDecision {
    ApprovalGate::default().evaluate(current_status, risk_level)
}
