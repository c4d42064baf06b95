//! Workflow states and transition resolution.
//!
//! The change workflow has no fixed graph on this side. The tracker is the
//! only authority on which moves are legal at a given moment, so
//! [`resolve_transition`] always works from a freshly fetched list of
//! [`Transition`]s and never from a static edge table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{NoSuchTransition, TransitionId};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Named stages a change issue moves through.
///
/// `Rejected` is reachable from most states; the ordering here is for display
/// only and implies nothing about legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    #[serde(rename = "Draft")]
    Draft,
    #[serde(rename = "In Staging")]
    InStaging,
    #[serde(rename = "Awaiting TechOps Approval")]
    AwaitingTechOpsApproval,
    #[serde(rename = "Approved for Prod")]
    ApprovedForProd,
    #[serde(rename = "Deploying to Prod")]
    DeployingToProd,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl WorkflowState {
    /// Every known state.
    pub const ALL: [WorkflowState; 7] = [
        WorkflowState::Draft,
        WorkflowState::InStaging,
        WorkflowState::AwaitingTechOpsApproval,
        WorkflowState::ApprovedForProd,
        WorkflowState::DeployingToProd,
        WorkflowState::Completed,
        WorkflowState::Rejected,
    ];

    /// Returns the state name exactly as the tracker spells it.
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Draft => "Draft",
            WorkflowState::InStaging => "In Staging",
            WorkflowState::AwaitingTechOpsApproval => "Awaiting TechOps Approval",
            WorkflowState::ApprovedForProd => "Approved for Prod",
            WorkflowState::DeployingToProd => "Deploying to Prod",
            WorkflowState::Completed => "Completed",
            WorkflowState::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state name that is not one of the known [`WorkflowState`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown workflow state \"{name}\". Known states: {}", known_states())]
pub struct UnknownWorkflowState {
    /// The name that failed to parse.
    pub name: String,
}

fn known_states() -> String {
    WorkflowState::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for WorkflowState {
    type Err = UnknownWorkflowState;

    /// Exact, case-sensitive match against the tracker spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownWorkflowState {
                name: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A move the tracker currently offers for an issue.
///
/// Only meaningful for the issue and moment it was fetched for; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Tracker id used to apply the transition.
    pub id: TransitionId,
    /// Display name of the transition (e.g. `"Start Review"`).
    pub name: String,
    /// Name of the state the transition leads to. Kept as the raw tracker
    /// string because the tracker may offer states this crate does not know.
    pub target_state: String,
}

/// Picks the first transition leading to `target`.
///
/// The comparison is exact and case-sensitive against
/// [`WorkflowState::as_str`]. When nothing matches, the error lists every
/// target that was on offer.
pub fn resolve_transition(
    available: &[Transition],
    target: WorkflowState,
) -> Result<&Transition, NoSuchTransition> {
    match available
        .iter()
        .find(|t| t.target_state == target.as_str())
    {
        Some(transition) => {
            debug!(
                target = %target,
                transition_id = %transition.id,
                transition = %transition.name,
                "resolved transition"
            );
            Ok(transition)
        }
        None => Err(NoSuchTransition {
            target,
            available: available.iter().map(|t| t.target_state.clone()).collect(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// What a pipeline step should do to get an issue into a target state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The issue is already in the target state; nothing to apply.
    AlreadyInState,
    /// Apply this transition.
    Apply(Transition),
}

impl TransitionPlan {
    /// Plans a move from `current_status` to `target`.
    ///
    /// Short-circuits before consulting `available` when the issue is already
    /// in `target`, so callers may pass an empty list in that case. Otherwise
    /// defers to [`resolve_transition`].
    pub fn for_issue(
        current_status: &str,
        target: WorkflowState,
        available: &[Transition],
    ) -> Result<Self, NoSuchTransition> {
        if current_status == target.as_str() {
            return Ok(TransitionPlan::AlreadyInState);
        }
        resolve_transition(available, target).map(|t| TransitionPlan::Apply(t.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(id: &str, name: &str, target: &str) -> Transition {
        Transition {
            id: TransitionId::new(id).unwrap(),
            name: name.to_string(),
            target_state: target.to_string(),
        }
    }

    #[test]
    fn state_names_round_trip_through_from_str() {
        for state in WorkflowState::ALL {
            assert_eq!(state.as_str().parse::<WorkflowState>(), Ok(state));
        }
    }

    #[test]
    fn state_parsing_is_case_sensitive() {
        let err = "completed".parse::<WorkflowState>().unwrap_err();
        assert!(err.to_string().contains("Known states: Draft, In Staging"));
    }

    #[test]
    fn first_match_wins() {
        let available = vec![
            transition("11", "Approve", "Approved for Prod"),
            transition("12", "Fast Approve", "Approved for Prod"),
        ];
        let picked = resolve_transition(&available, WorkflowState::ApprovedForProd).unwrap();
        assert_eq!(picked.id.as_str(), "11");
    }

    #[test]
    fn empty_offer_is_reported_as_none() {
        let err = resolve_transition(&[], WorkflowState::Completed).unwrap_err();
        assert!(err.available.is_empty());
        assert!(err.to_string().ends_with("Available transitions: (none)"));
    }

    #[test]
    fn plan_short_circuits_when_already_in_state() {
        let plan = TransitionPlan::for_issue("Completed", WorkflowState::Completed, &[]).unwrap();
        assert_eq!(plan, TransitionPlan::AlreadyInState);
    }

    #[test]
    fn plan_applies_the_resolved_transition() {
        let available = vec![transition("21", "Ship", "Completed")];
        let plan =
            TransitionPlan::for_issue("Deploying to Prod", WorkflowState::Completed, &available)
                .unwrap();
        assert_eq!(plan, TransitionPlan::Apply(available[0].clone()));
    }
}
