//! Newtype identifiers.
//!
//! Issue keys, issue ids, and transition ids are all plain strings on the
//! wire. Wrapping each in its own type stops a transition id from being passed
//! where an issue key is expected, which the tracker would otherwise accept
//! and answer with a confusing 404.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or only whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: tracker-assigned
// ---------------------------------------------------------------------------

string_id! {
    /// Human-facing key of a tracker issue (e.g. `"CHGTEST-123"`).
    ///
    /// Pipelines pass this between jobs as `CHANGE_KEY`.
    IssueKey
}

string_id! {
    /// Opaque internal id the tracker assigns to an issue.
    IssueId
}

string_id! {
    /// Id of a workflow transition as reported by the tracker.
    ///
    /// Only valid for the issue and moment it was fetched for.
    TransitionId
}

// ---------------------------------------------------------------------------
// Identifiers: configuration
// ---------------------------------------------------------------------------

string_id! {
    /// Key of the tracker project change issues are filed under.
    ProjectKey
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single CLI invocation.
///
/// Generated fresh for every process; recorded on the root span so all
/// tracker calls from one pipeline step can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
