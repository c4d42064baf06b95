//! Issue-tracker port.
//!
//! [`IssueTracker`] is the only way the governance layer reaches the outside
//! world. Implementations own transport, authentication, base URLs, and
//! status-code handling; this module only fixes the shapes that cross the
//! boundary.
//!
//! Each call is single-shot. Nothing here retries, polls, or times out; an
//! implementation that needs back-off adds it behind the trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ChangeRequest, IssueId, IssueKey, TrackerError, Transition, TransitionId};

/// Identity of an issue the tracker just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: IssueId,
    pub key: IssueKey,
}

/// Point-in-time view of an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub key: IssueKey,
    /// Name of the workflow status the issue is in right now.
    pub status: String,
    /// Custom field values keyed by the tracker's field id, flattened to text.
    /// Fields with no value are omitted.
    pub custom_fields: BTreeMap<String, String>,
}

impl IssueSnapshot {
    /// Returns the value of a custom field, if set.
    pub fn custom_field(&self, field_id: &str) -> Option<&str> {
        self.custom_fields.get(field_id).map(String::as_str)
    }
}

/// Gateway to the issue tracker that holds change issues.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Files `request` as a new change issue.
    async fn create_issue(&self, request: &ChangeRequest) -> Result<CreatedIssue, TrackerError>;

    /// Reads the issue's current status and custom fields.
    async fn get_issue(&self, key: &IssueKey) -> Result<IssueSnapshot, TrackerError>;

    /// Lists the transitions the tracker offers for the issue right now, in
    /// tracker order.
    async fn available_transitions(&self, key: &IssueKey)
        -> Result<Vec<Transition>, TrackerError>;

    /// Applies a transition previously returned by
    /// [`available_transitions`](Self::available_transitions).
    async fn apply_transition(
        &self,
        key: &IssueKey,
        transition: &TransitionId,
    ) -> Result<(), TrackerError>;
}
