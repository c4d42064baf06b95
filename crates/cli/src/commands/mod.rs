//! Pipeline commands. Each one performs at most one read of the issue's
//! current state and at most one mutation.

pub mod create_change;
pub mod transition;
pub mod verify_approval;

use anyhow::anyhow;
use governance::IssueKey;

/// Parses a change key given on the command line or in `CHANGE_KEY`.
fn change_key(raw: Option<&str>) -> anyhow::Result<IssueKey> {
    raw.and_then(IssueKey::new).ok_or_else(|| {
        anyhow!("Change key is required. Use --change-key or set CHANGE_KEY environment variable.")
    })
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory `IssueTracker` for command tests.

    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use governance::{
        ChangeRequest, CreatedIssue, IssueId, IssueKey, IssueSnapshot, IssueTracker, TrackerError,
        Transition, TransitionId,
    };

    #[derive(Default)]
    pub struct FakeTracker {
        created: Mutex<Vec<ChangeRequest>>,
        issues: Mutex<BTreeMap<String, IssueSnapshot>>,
        transitions: Mutex<Vec<Transition>>,
        applied: Mutex<Vec<String>>,
        transition_reads: Mutex<usize>,
    }

    impl FakeTracker {
        pub fn with_issue(self, key: &str, status: &str, fields: &[(&str, &str)]) -> Self {
            self.issues.lock().unwrap().insert(
                key.to_string(),
                IssueSnapshot {
                    key: IssueKey::new(key).unwrap(),
                    status: status.to_string(),
                    custom_fields: fields
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
            );
            self
        }

        pub fn offering(self, offered: &[(&str, &str)]) -> Self {
            *self.transitions.lock().unwrap() = offered
                .iter()
                .map(|(id, target)| Transition {
                    id: TransitionId::new(*id).unwrap(),
                    name: format!("Move to {target}"),
                    target_state: target.to_string(),
                })
                .collect();
            self
        }

        pub fn created(&self) -> Vec<ChangeRequest> {
            self.created.lock().unwrap().clone()
        }

        pub fn applied(&self) -> Vec<String> {
            self.applied.lock().unwrap().clone()
        }

        pub fn transition_reads(&self) -> usize {
            *self.transition_reads.lock().unwrap()
        }
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn create_issue(
            &self,
            request: &ChangeRequest,
        ) -> Result<CreatedIssue, TrackerError> {
            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            let n = created.len();
            Ok(CreatedIssue {
                id: IssueId::new(format!("1000{n}")).unwrap(),
                key: IssueKey::new(format!("CHG-{n}")).unwrap(),
            })
        }

        async fn get_issue(&self, key: &IssueKey) -> Result<IssueSnapshot, TrackerError> {
            self.issues
                .lock()
                .unwrap()
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| TrackerError::NotFound {
                    key: key.to_string(),
                })
        }

        async fn available_transitions(
            &self,
            _key: &IssueKey,
        ) -> Result<Vec<Transition>, TrackerError> {
            *self.transition_reads.lock().unwrap() += 1;
            Ok(self.transitions.lock().unwrap().clone())
        }

        async fn apply_transition(
            &self,
            _key: &IssueKey,
            transition: &TransitionId,
        ) -> Result<(), TrackerError> {
            self.applied.lock().unwrap().push(transition.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_change_key_is_rejected() {
        assert!(change_key(None).is_err());
        assert!(change_key(Some(" ")).is_err());
        assert_eq!(change_key(Some("CHG-9")).unwrap().as_str(), "CHG-9");
    }
}
