//! ReleaseLens CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags with environment-variable
//!    fallbacks (`JIRA_*`, `GITHUB_*`, `CHANGE_KEY`).
//! 2. **Wire observability**: configure `tracing-subscriber` with a pretty or
//!    JSON layer on stderr, plus an OpenTelemetry OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Construct infrastructure**: build the [`jira::JiraClient`] and hand
//!    it to the commands as a [`governance::IssueTracker`].
//! 4. **Run one pipeline step** (`create-change`, `transition`, or
//!    `verify-approval`) and turn the result into stdout lines,
//!    `GITHUB_OUTPUT` entries, and a process exit code.

mod commands;
mod manifest_source;
mod observability;
mod outputs;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info_span, Instrument};

use governance::InvocationId;
use jira::{CustomFieldMap, JiraClient, JiraConfig};

use crate::commands::{create_change, transition, verify_approval};
use crate::observability::LogFormat;
use crate::outputs::PipelineOutputs;

#[derive(Parser)]
#[command(name = "releaselens", version, about = "Change governance for release pipelines")]
struct Cli {
    /// Log output format (logs go to stderr).
    #[arg(long, global = true, env = "RELEASELENS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(flatten)]
    jira: JiraArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct JiraArgs {
    /// Jira site root, e.g. https://acme.atlassian.net
    #[arg(long, global = true, env = "JIRA_BASE_URL")]
    jira_base_url: Option<String>,

    /// Account used to authenticate against Jira.
    #[arg(long, global = true, env = "JIRA_USER_EMAIL")]
    jira_user_email: Option<String>,

    /// API token for the Jira account.
    #[arg(long, global = true, env = "JIRA_API_TOKEN", hide_env_values = true)]
    jira_api_token: Option<String>,

    /// Project change issues are filed under.
    #[arg(long, global = true, env = "JIRA_CHANGE_PROJECT_KEY")]
    jira_project_key: Option<String>,
}

impl JiraArgs {
    fn client(&self) -> anyhow::Result<JiraClient> {
        let config = JiraConfig::from_parts(
            self.jira_base_url.clone(),
            self.jira_user_email.clone(),
            self.jira_api_token.clone(),
            self.jira_project_key.clone(),
            CustomFieldMap::from_env(),
        )?;
        JiraClient::new(config).context("Failed to construct Jira client")
    }
}

#[derive(Subcommand)]
enum Command {
    /// Validate the deployment manifest and file a change issue for it.
    CreateChange(create_change::CreateChangeArgs),

    /// Move a change issue to a workflow state.
    Transition(transition::TransitionArgs),

    /// Check that a change may be promoted to production.
    VerifyApproval(verify_approval::VerifyApprovalArgs),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::CreateChange(_) => "create-change",
            Command::Transition(_) => "transition",
            Command::VerifyApproval(_) => "verify-approval",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init(cli.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let span = info_span!(
        "releaselens",
        invocation_id = %InvocationId::new_random(),
        command = cli.command.name()
    );
    let code = match run(cli).instrument(span).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    };

    drop(telemetry);
    code
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let outputs = PipelineOutputs::from_env();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::CreateChange(args) => {
            let prepared = create_change::prepare(&args, |name| std::env::var(name).ok()).await?;
            if args.dry_run {
                create_change::print_dry_run(&prepared, &mut stdout)?;
                return Ok(ExitCode::SUCCESS);
            }
            let client = cli.jira.client()?;
            create_change::submit(
                &client,
                &prepared,
                |key| client.config().browse_url(key),
                &outputs,
                &mut stdout,
            )
            .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Transition(args) => {
            let client = cli.jira.client()?;
            transition::run(&client, &args, &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::VerifyApproval(args) => {
            let client = cli.jira.client()?;
            let risk_field = client.config().fields.risk_level.clone();
            let permitted =
                verify_approval::run(&client, &args, &risk_field, &outputs, &mut stdout).await?;
            Ok(if permitted {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
