//! ReleaseLens Jira infrastructure adapter.
//!
//! Implements the [`governance::IssueTracker`] port against the Jira Cloud
//! REST API v3. Change requests are filed as issues of type `Change`, with
//! each governance attribute written to a configurable custom field.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Authentication, URL layout, custom-field ids, the
//! Atlassian Document Format, and HTTP status handling all live here. The
//! [`governance`] crate sees only [`governance::IssueTracker`].
//!
//! ## Configuration
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `JIRA_BASE_URL` | Site root, e.g. `https://acme.atlassian.net` |
//! | `JIRA_USER_EMAIL` | Account used for basic auth |
//! | `JIRA_API_TOKEN` | API token for that account |
//! | `JIRA_CHANGE_PROJECT_KEY` | Project for change issues (default `CHGTEST`) |
//! | `JIRA_FIELD_<NAME>` | Override one custom-field id (see [`CustomFieldMap`]) |

mod client;
mod config;
mod payload;

pub use client::JiraClient;
pub use config::{CustomFieldMap, JiraConfig, JiraConfigError, DEFAULT_PROJECT_KEY};
