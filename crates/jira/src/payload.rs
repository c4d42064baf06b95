//! Jira REST v3 wire shapes.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use governance::{ChangeRequest, ProjectKey};

use crate::CustomFieldMap;

/// Issue type change requests are filed as.
pub(crate) const CHANGE_ISSUE_TYPE: &str = "Change";

/// Body of `POST /issue` for a change request.
pub(crate) fn create_issue_body(
    project: &ProjectKey,
    fields: &CustomFieldMap,
    request: &ChangeRequest,
) -> Value {
    let mut body = Map::new();
    body.insert("project".into(), json!({ "key": project.as_str() }));
    body.insert("summary".into(), json!(request.summary));
    body.insert("issuetype".into(), json!({ "name": CHANGE_ISSUE_TYPE }));
    body.insert("description".into(), to_adf(&request.description));

    let custom = [
        (&fields.service, json!(request.service)),
        (&fields.environment, json!(request.environment)),
        (&fields.risk_level, json!(request.risk_level.as_str())),
        (&fields.blast_radius, json!(request.blast_radius)),
        (&fields.services_impacted, json!(request.services_impacted)),
        (&fields.data_migration, json!(request.data_migration)),
        (&fields.backward_compatible, json!(request.backward_compatible)),
        (&fields.rollback_method, json!(request.rollback_method)),
        (&fields.rollback_target_version, json!(request.rollback_target_version)),
        (
            &fields.rollback_data_restore,
            json!(request.rollback_data_restore_required),
        ),
        (&fields.team, json!(request.team)),
        (&fields.slack_channel, json!(request.slack_channel)),
        (&fields.git_tag, json!(request.git_tag)),
        (&fields.github_run_url, json!(request.pipeline_run_url)),
    ];
    for (id, value) in custom {
        body.insert(id.clone(), value);
    }
    if let Some(minutes) = request.rollback_est_time_minutes {
        body.insert(fields.rollback_est_time.clone(), json!(minutes));
    }

    json!({ "fields": body })
}

/// Renders plain text as an Atlassian Document Format document.
///
/// Blank-line-separated blocks become paragraphs; single newlines inside a
/// block become hard breaks, so the indented layout survives.
pub(crate) fn to_adf(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .split("\n\n")
        .map(|block| {
            let mut content = Vec::new();
            for (i, line) in block.lines().enumerate() {
                if i > 0 {
                    content.push(json!({ "type": "hardBreak" }));
                }
                if !line.is_empty() {
                    content.push(json!({ "type": "text", "text": line }));
                }
            }
            json!({ "type": "paragraph", "content": content })
        })
        .collect();

    json!({ "type": "doc", "version": 1, "content": paragraphs })
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedIssueResponse {
    pub id: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueResponse {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueFields {
    pub status: NamedRef,
    #[serde(flatten)]
    pub rest: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionsResponse {
    pub transitions: Vec<TransitionEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionEntry {
    pub id: String,
    pub name: String,
    pub to: NamedRef,
}

/// Flattens a custom-field value to text.
///
/// Strings pass through; numbers and booleans use their JSON text; select
/// options use their `value` (or `name`). Empty and structured values with
/// no recognisable text are dropped.
pub(crate) fn flatten_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .and_then(flatten_field),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_field).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
    }
}
