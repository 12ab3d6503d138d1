//! CLI entry point
//!
//! Assembles the collaborators from the Action inputs and drives one
//! orchestrator run. Exit-code policy: 0 for every handled outcome
//! (including generated-test failures and skipped executions), 2 for
//! setup errors, 70 for collaborator failures during required stages.

use clap::Parser;
use tracing::{error, info, warn};

use surfcheck_config::{Config, ConfigError, EventContext, RawInputs};
use surfcheck_engine::{Orchestrator, RunReport};
use surfcheck_github::GithubClient;
use surfcheck_llm::AnthropicClient;
use surfcheck_redaction::Sanitizer;
use surfcheck_utils::{ExitCode, SurfCheckError, init_tracing};

use crate::outputs;

/// Run the Action to completion.
///
/// # Errors
///
/// Returns the process exit code for setup and collaborator failures;
/// every handled outcome is `Ok(())`.
pub async fn run() -> Result<(), ExitCode> {
    let raw = RawInputs::parse();

    // A second init (e.g. under tests) is harmless.
    let _ = init_tracing(raw.verbose);

    match execute(raw).await {
        Ok(report) => {
            info!(
                pr = report.pr_number,
                passed = report.result.passed(),
                "Run complete"
            );
            if let Err(e) = outputs::write_outputs(&report) {
                warn!(error = %e, "Failed to write Action outputs");
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e.display_for_user());
            eprintln!("surfcheck: {}", e.display_for_user());
            Err(e.to_exit_code())
        }
    }
}

async fn execute(raw: RawInputs) -> Result<RunReport, SurfCheckError> {
    let event = EventContext::from_env()?;
    let config = Config::resolve(raw, event)?;

    let github = GithubClient::new(&config.repo, &config.github_token)?;
    let llm = AnthropicClient::new(&config.anthropic_api_key)?;
    let sanitizer = Sanitizer::with_literals(&config.secret_literals()).map_err(|e| {
        ConfigError::InvalidValue {
            key: "redaction-patterns".to_string(),
            value: e.to_string(),
        }
    })?;

    Orchestrator::new(github, llm, config, sanitizer).run().await
}
