//! `releaselens transition`: move a change issue to a workflow state.

use std::io::Write;

use anyhow::Context;
use clap::Args;
use tracing::info;

use governance::{IssueTracker, TransitionPlan, WorkflowState};

use super::change_key;

#[derive(Debug, Args)]
pub struct TransitionArgs {
    /// Key of the change issue.
    #[arg(long, env = "CHANGE_KEY")]
    pub change_key: Option<String>,

    /// Target workflow state, spelled exactly as in the tracker.
    #[arg(long, default_value = "Completed")]
    pub state: WorkflowState,
}

/// What the command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    AlreadyInState,
    Transitioned { from: String, via: String },
}

pub async fn run(
    tracker: &dyn IssueTracker,
    args: &TransitionArgs,
    out: &mut impl Write,
) -> anyhow::Result<TransitionOutcome> {
    let key = change_key(args.change_key.as_deref())?;
    let target = args.state;

    let issue = tracker
        .get_issue(&key)
        .await
        .with_context(|| format!("Failed to fetch {key}"))?;
    info!(key = %key, status = %issue.status, target = %target, "fetched current issue state");

    // Transitions are only fetched when a move is actually needed.
    let available = if issue.status == target.as_str() {
        Vec::new()
    } else {
        tracker
            .available_transitions(&key)
            .await
            .with_context(|| format!("Failed to fetch transitions for {key}"))?
    };

    let plan = TransitionPlan::for_issue(&issue.status, target, &available)
        .with_context(|| format!("Failed to transition {key} to {target}"))?;

    let outcome = match plan {
        TransitionPlan::AlreadyInState => {
            info!(key = %key, state = %target, "issue already in target state");
            TransitionOutcome::AlreadyInState
        }
        TransitionPlan::Apply(transition) => {
            tracker
                .apply_transition(&key, &transition.id)
                .await
                .with_context(|| format!("Failed to transition {key} to {target}"))?;
            info!(key = %key, from = %issue.status, to = %target, "transitioned issue");
            TransitionOutcome::Transitioned {
                from: issue.status.clone(),
                via: transition.name,
            }
        }
    };

    writeln!(out, "CHANGE_KEY={key}")?;
    writeln!(out, "STATUS={target}")?;
    Ok(outcome)
}
