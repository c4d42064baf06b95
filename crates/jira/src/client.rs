//! HTTP client for the Jira Cloud REST API v3.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info};

use governance::{
    ChangeRequest, CreatedIssue, IssueId, IssueKey, IssueSnapshot, IssueTracker, TrackerError,
    Transition, TransitionId,
};

use crate::payload::{
    create_issue_body, flatten_field, CreatedIssueResponse, IssueResponse, TransitionsResponse,
};
use crate::JiraConfig;

/// Issue tracker backed by a Jira site.
///
/// Every trait call is exactly one HTTP request. Nothing is cached and
/// nothing is retried.
pub struct JiraClient {
    client: Client,
    api_base: String,
    config: JiraConfig,
}

impl JiraClient {
    /// Creates a client for the configured site.
    pub fn new(config: JiraConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            api_base: format!("{}/rest/api/3", config.base_url),
            config,
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(
                &self.config.user_email,
                Some(self.config.api_token.expose_secret()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(
        &self,
        request: RequestBuilder,
        key: Option<&IssueKey>,
    ) -> Result<Response, TrackerError> {
        let response = self.authed(request).send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "Jira request failed");
        match (status, key) {
            (StatusCode::NOT_FOUND, Some(key)) => Err(TrackerError::NotFound {
                key: key.to_string(),
            }),
            _ => Err(TrackerError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
        response.json().await.map_err(|e| TrackerError::Decode {
            message: e.to_string(),
        })
    }
}

fn transport(err: reqwest::Error) -> TrackerError {
    TrackerError::Transport {
        message: err.to_string(),
    }
}

fn decode(what: &str) -> TrackerError {
    TrackerError::Decode {
        message: format!("Jira returned an empty {what}"),
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn create_issue(&self, request: &ChangeRequest) -> Result<CreatedIssue, TrackerError> {
        let url = format!("{}/issue", self.api_base);
        debug!(url = %url, summary = %request.summary, "creating change issue");

        let body = create_issue_body(&self.config.project_key, &self.config.fields, request);
        let response = self.send(self.client.post(&url).json(&body), None).await?;
        let created: CreatedIssueResponse = Self::json(response).await?;

        let issue = CreatedIssue {
            id: IssueId::new(created.id).ok_or_else(|| decode("issue id"))?,
            key: IssueKey::new(created.key).ok_or_else(|| decode("issue key"))?,
        };
        info!(key = %issue.key, "created change issue");
        Ok(issue)
    }

    async fn get_issue(&self, key: &IssueKey) -> Result<IssueSnapshot, TrackerError> {
        let url = format!("{}/issue/{}", self.api_base, key);
        let fields = std::iter::once("status")
            .chain(self.config.fields.ids())
            .collect::<Vec<_>>()
            .join(",");
        debug!(url = %url, "fetching issue");

        let request = self.client.get(&url).query(&[("fields", fields)]);
        let response = self.send(request, Some(key)).await?;
        let issue: IssueResponse = Self::json(response).await?;

        let custom_fields = issue
            .fields
            .rest
            .iter()
            .filter(|(id, _)| id.starts_with("customfield_"))
            .filter_map(|(id, value)| flatten_field(value).map(|v| (id.clone(), v)))
            .collect();

        Ok(IssueSnapshot {
            key: IssueKey::new(issue.key).ok_or_else(|| decode("issue key"))?,
            status: issue.fields.status.name,
            custom_fields,
        })
    }

    async fn available_transitions(
        &self,
        key: &IssueKey,
    ) -> Result<Vec<Transition>, TrackerError> {
        let url = format!("{}/issue/{}/transitions", self.api_base, key);
        debug!(url = %url, "fetching transitions");

        let response = self.send(self.client.get(&url), Some(key)).await?;
        let listed: TransitionsResponse = Self::json(response).await?;

        listed
            .transitions
            .into_iter()
            .map(|t| {
                Ok(Transition {
                    id: TransitionId::new(t.id).ok_or_else(|| decode("transition id"))?,
                    name: t.name,
                    target_state: t.to.name,
                })
            })
            .collect()
    }

    async fn apply_transition(
        &self,
        key: &IssueKey,
        transition: &TransitionId,
    ) -> Result<(), TrackerError> {
        let url = format!("{}/issue/{}/transitions", self.api_base, key);
        debug!(url = %url, transition_id = %transition, "applying transition");

        let body = json!({ "transition": { "id": transition.as_str() } });
        self.send(self.client.post(&url).json(&body), Some(key))
            .await?;
        info!(key = %key, transition_id = %transition, "applied transition");
        Ok(())
    }
}
