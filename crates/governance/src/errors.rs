//! Error taxonomy for the change-governance domain.
//!
//! Hard failures are [`ValidationError`] (the manifest is incomplete or
//! invalid) and [`NoSuchTransition`] (the tracker does not currently offer a
//! move to the requested state). [`TrackerError`] is what an
//! [`crate::IssueTracker`] implementation reports when the backend call itself
//! fails.
//!
//! An unrecognised risk level is deliberately *not* an error. The approval
//! gate always returns a decision; see [`crate::ApprovalBasis::UnknownRisk`].
//!
//! None of these are retried or recovered inside this crate. They propagate
//! unchanged to the caller, which decides what the process exit looks like.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WorkflowState;

// ---------------------------------------------------------------------------
// Manifest validation
// ---------------------------------------------------------------------------

/// A deployment manifest failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// The decoded manifest document is not a key/value mapping.
    #[error("Deployment manifest must be a mapping, found {found}")]
    NotAMapping {
        /// JSON-ish name of what was found instead (e.g. `"array"`).
        found: String,
    },

    /// A required field is absent or `null`.
    ///
    /// `field` is a dotted path for nested fields (e.g. `"impact.risk_level"`).
    #[error("Missing required field in deployment manifest: {field}")]
    MissingField {
        /// Path of the missing field.
        field: String,
    },

    /// `impact.risk_level` is present but not one of the allowed values.
    #[error("Invalid risk_level: {value}. Must be one of: {}", .allowed.join(", "))]
    InvalidRiskLevel {
        /// The offending value, rendered as text.
        value: String,
        /// The allowed set, in ascending order of risk.
        allowed: Vec<String>,
    },

    /// The manifest has every required field but its structure does not
    /// decode (wrong type, missing nested field, negative estimate, ...).
    #[error("Malformed deployment manifest: {message}")]
    Malformed {
        /// Decoder message describing the first problem found.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Transition resolution
// ---------------------------------------------------------------------------

/// The requested workflow state is not reachable from the issue's current
/// state according to the transitions the tracker reported.
///
/// Carries every target that *was* available so a misconfigured workflow can
/// be diagnosed from the message alone.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("No transition available to state \"{target}\". Available transitions: {}", available_display(.available))]
pub struct NoSuchTransition {
    /// The state that was requested.
    pub target: WorkflowState,
    /// Target-state names of every transition that was offered, in tracker order.
    pub available: Vec<String>,
}

fn available_display(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

// ---------------------------------------------------------------------------
// Tracker port
// ---------------------------------------------------------------------------

/// Failure reported by an [`crate::IssueTracker`] implementation.
///
/// The domain does not interpret these beyond propagating them; there is no
/// retry policy attached because no call is ever retried.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TrackerError {
    /// The referenced issue does not exist (or is not visible to the caller).
    #[error("Issue not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The tracker answered, but refused the request.
    #[error("Tracker rejected the request with status {status}: {body}")]
    Rejected {
        /// HTTP-style status code returned by the backend.
        status: u16,
        /// Response body, verbatim, for diagnosis.
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("Tracker transport failure: {message}")]
    Transport {
        /// Underlying transport error message.
        message: String,
    },

    /// The tracker responded with something that could not be decoded.
    #[error("Could not decode tracker response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Umbrella
// ---------------------------------------------------------------------------

/// Any hard failure the governance layer can surface.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// See [`NoSuchTransition`].
    #[error(transparent)]
    NoSuchTransition(#[from] NoSuchTransition),

    /// See [`TrackerError`].
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
