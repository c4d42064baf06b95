//! Change-governance domain for ReleaseLens.
//!
//! This crate holds every decision the release pipeline makes about a change:
//! whether a deployment manifest is complete, what change request it turns
//! into, which workflow transition moves an issue to a requested state, and
//! whether a production promotion is permitted. Infrastructure crates
//! implement the [`IssueTracker`] port defined here; they never add
//! governance rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! Every function is a synchronous, pure computation over in-memory values.
//! Network access happens only behind [`IssueTracker`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueKey`, `TransitionId`, etc.) |
//! | [`manifest`] | Deployment manifest model and the manifest validator |
//! | [`change_request`] | Change-request derivation and description rendering |
//! | [`workflow`] | Workflow states and transition resolution |
//! | [`approval`] | Risk levels and the production approval gate |
//! | [`tracker`] | The issue-tracker port trait and its value shapes |
//! | [`errors`] | Error taxonomy |
//!
//! ## Concurrency
//!
//! Nothing here coordinates concurrent transitions on the same issue. Two
//! pipeline runs racing on one issue can both read the same status and both
//! attempt a mutation; callers that need mutual exclusion must hold an
//! advisory lock around the tracker calls.

pub mod approval;
pub mod change_request;
pub mod errors;
pub mod identifiers;
pub mod manifest;
pub mod tracker;
pub mod workflow;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use approval::{
    evaluate, ApprovalBasis, ApprovalDecision, ApprovalGate, RiskLevel, UnknownRiskPolicy,
    APPROVED_STATUS,
};
pub use change_request::{parse_dev_tickets, ChangeRequest, ReleaseContext, TestSummary};
pub use errors::{GovernanceError, NoSuchTransition, TrackerError, ValidationError};
pub use identifiers::{InvocationId, IssueId, IssueKey, ProjectKey, TransitionId};
pub use manifest::{
    validate, DeploymentManifest, Impact, Owner, Rollback, Tests, ValidatedManifest,
    REQUIRED_FIELDS,
};
pub use tracker::{CreatedIssue, IssueSnapshot, IssueTracker};
pub use workflow::{resolve_transition, Transition, TransitionPlan, UnknownWorkflowState, WorkflowState};
