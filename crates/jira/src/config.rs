//! Jira connection settings and custom-field mapping.

use secrecy::SecretString;
use thiserror::Error;

use governance::ProjectKey;

/// Project change issues are filed under when none is configured.
pub const DEFAULT_PROJECT_KEY: &str = "CHGTEST";

/// Jira configuration is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JiraConfigError {
    #[error(
        "Missing required Jira configuration ({}). Ensure JIRA_BASE_URL, JIRA_USER_EMAIL, and JIRA_API_TOKEN are set.",
        .missing.join(", ")
    )]
    Missing { missing: Vec<&'static str> },

    #[error("Invalid Jira project key: {0:?}")]
    InvalidProjectKey(String),
}

/// Connection settings for a Jira site.
#[derive(Debug)]
pub struct JiraConfig {
    /// Site root without trailing slash, e.g. `https://acme.atlassian.net`.
    pub base_url: String,
    pub user_email: String,
    pub api_token: SecretString,
    pub project_key: ProjectKey,
    pub fields: CustomFieldMap,
}

impl JiraConfig {
    /// Assembles a configuration from optional parts, as read from flags or
    /// the environment.
    ///
    /// Blank values count as missing. The project key falls back to
    /// [`DEFAULT_PROJECT_KEY`].
    pub fn from_parts(
        base_url: Option<String>,
        user_email: Option<String>,
        api_token: Option<String>,
        project_key: Option<String>,
        fields: CustomFieldMap,
    ) -> Result<Self, JiraConfigError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (base_url, user_email, api_token) =
            (present(base_url), present(user_email), present(api_token));

        let missing: Vec<&'static str> = [
            ("JIRA_BASE_URL", base_url.is_none()),
            ("JIRA_USER_EMAIL", user_email.is_none()),
            ("JIRA_API_TOKEN", api_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(base_url), Some(user_email), Some(api_token)) = (base_url, user_email, api_token)
        else {
            return Err(JiraConfigError::Missing { missing });
        };

        let project_key = present(project_key).unwrap_or_else(|| DEFAULT_PROJECT_KEY.to_string());
        let project_key = ProjectKey::new(project_key.clone())
            .ok_or(JiraConfigError::InvalidProjectKey(project_key))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_email,
            api_token: SecretString::from(api_token),
            project_key,
            fields,
        })
    }

    /// Link to an issue in the Jira UI.
    pub fn browse_url(&self, key: &governance::IssueKey) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }
}

// ---------------------------------------------------------------------------
// Custom fields
// ---------------------------------------------------------------------------

/// Jira custom-field ids that change-request attributes are written to.
///
/// Ids differ per Jira site. Each one can be overridden with a
/// `JIRA_FIELD_<NAME>` variable, where `<NAME>` is the upper-cased attribute
/// name (e.g. `JIRA_FIELD_RISK_LEVEL=customfield_12345`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldMap {
    pub service: String,
    pub environment: String,
    pub risk_level: String,
    pub blast_radius: String,
    pub services_impacted: String,
    pub data_migration: String,
    pub backward_compatible: String,
    pub rollback_method: String,
    pub rollback_target_version: String,
    pub rollback_est_time: String,
    pub rollback_data_restore: String,
    pub team: String,
    pub slack_channel: String,
    pub git_tag: String,
    pub github_run_url: String,
}

impl Default for CustomFieldMap {
    fn default() -> Self {
        Self {
            service: "customfield_10001".to_string(),
            environment: "customfield_10002".to_string(),
            risk_level: "customfield_10003".to_string(),
            blast_radius: "customfield_10004".to_string(),
            services_impacted: "customfield_10005".to_string(),
            data_migration: "customfield_10006".to_string(),
            backward_compatible: "customfield_10007".to_string(),
            rollback_method: "customfield_10008".to_string(),
            rollback_target_version: "customfield_10009".to_string(),
            rollback_est_time: "customfield_10010".to_string(),
            rollback_data_restore: "customfield_10011".to_string(),
            team: "customfield_10012".to_string(),
            slack_channel: "customfield_10013".to_string(),
            git_tag: "customfield_10014".to_string(),
            github_run_url: "customfield_10015".to_string(),
        }
    }
}

impl CustomFieldMap {
    /// Defaults, overridden from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `JIRA_FIELD_*` overrides looked up through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (name, slot) in self.named_mut() {
            if let Some(id) = lookup(&format!("JIRA_FIELD_{name}")).filter(|v| !v.trim().is_empty())
            {
                *slot = id;
            }
        }
        self
    }

    /// Every mapped field id, in a stable order.
    pub fn ids(&self) -> Vec<&str> {
        vec![
            &self.service,
            &self.environment,
            &self.risk_level,
            &self.blast_radius,
            &self.services_impacted,
            &self.data_migration,
            &self.backward_compatible,
            &self.rollback_method,
            &self.rollback_target_version,
            &self.rollback_est_time,
            &self.rollback_data_restore,
            &self.team,
            &self.slack_channel,
            &self.git_tag,
            &self.github_run_url,
        ]
        .into_iter()
        .map(String::as_str)
        .collect()
    }

    fn named_mut(&mut self) -> [(&'static str, &mut String); 15] {
        [
            ("SERVICE", &mut self.service),
            ("ENVIRONMENT", &mut self.environment),
            ("RISK_LEVEL", &mut self.risk_level),
            ("BLAST_RADIUS", &mut self.blast_radius),
            ("SERVICES_IMPACTED", &mut self.services_impacted),
            ("DATA_MIGRATION", &mut self.data_migration),
            ("BACKWARD_COMPATIBLE", &mut self.backward_compatible),
            ("ROLLBACK_METHOD", &mut self.rollback_method),
            ("ROLLBACK_TARGET_VERSION", &mut self.rollback_target_version),
            ("ROLLBACK_EST_TIME", &mut self.rollback_est_time),
            ("ROLLBACK_DATA_RESTORE", &mut self.rollback_data_restore),
            ("TEAM", &mut self.team),
            ("SLACK_CHANNEL", &mut self.slack_channel),
            ("GIT_TAG", &mut self.git_tag),
            ("GITHUB_RUN_URL", &mut self.github_run_url),
        ]
    }
}
