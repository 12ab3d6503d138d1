//! Execution stage
//!
//! The one place the "never fail the PR" promise is enforced: every
//! failure on this path, whether a dependency install, a spawn error, a
//! timeout, or a non-zero exit, is caught and folded into an
//! [`ExecutionOutcome`] instead of propagating. Runs that produced
//! output are classified later; runs that never started come back with
//! the skipped flag set.

use std::time::Duration;

use tracing::{info, warn};

use crate::result::ExecutionOutcome;
use surfcheck_config::Config;
use surfcheck_provision::{PackageSpec, Provisioner};
use surfcheck_runner::{EnvOverlay, RunnerError, ScriptRunner};
use surfcheck_utils::error::ProvisionError;

/// Runtime packages every generated script is assumed to import.
fn required_packages() -> Vec<PackageSpec> {
    vec![PackageSpec::new("playwright")]
}

/// Environment overlay injected into the generated script.
///
/// Built per run and passed explicitly into the spawn call; ambient
/// process environment is never mutated.
#[must_use]
pub fn execution_env(config: &Config, target_url: &str) -> EnvOverlay {
    let mut env = EnvOverlay::new();
    env.insert("BASE_URL".to_string(), target_url.to_string());
    env.insert(
        "ANTHROPIC_API_KEY".to_string(),
        config.anthropic_api_key.clone(),
    );
    if let Some(user) = &config.test_user {
        env.insert("TEST_USER_EMAIL".to_string(), user.email.clone());
        env.insert("TEST_USER_PASSWORD".to_string(), user.password.clone());
    }
    env.insert("CI".to_string(), "true".to_string());
    env
}

/// Provision dependencies and run the script, downgrading every failure.
pub async fn execute_script(
    provisioner: &Provisioner,
    runner: &ScriptRunner,
    script: &str,
    env: &EnvOverlay,
    timeout: Duration,
) -> ExecutionOutcome {
    if let Err(e) = provisioner.ensure(&required_packages()).await {
        warn!(error = %e, "Provisioning failed; marking execution skipped");
        return ExecutionOutcome::skipped(provision_failure_message(&e));
    }

    info!(timeout_secs = timeout.as_secs(), "Executing generated script");

    match runner.run(script, env, timeout).await {
        Ok(output) => ExecutionOutcome {
            success: true,
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            skipped: false,
            error: None,
        },
        Err(RunnerError::ExitFailure {
            code,
            stdout,
            stderr,
        }) => {
            warn!(code, "Generated script exited non-zero");
            ExecutionOutcome {
                success: true,
                stdout,
                stderr,
                exit_code: Some(code),
                skipped: false,
                error: Some(format!("script exited with code {code}")),
            }
        }
        Err(RunnerError::Timeout {
            timeout_seconds,
            stdout,
            stderr,
        }) => {
            warn!(timeout_seconds, "Generated script timed out");
            ExecutionOutcome {
                success: true,
                stdout,
                stderr,
                exit_code: None,
                skipped: false,
                error: Some(format!(
                    "script timed out after {timeout_seconds} seconds"
                )),
            }
        }
        Err(e @ (RunnerError::SpawnFailed { .. } | RunnerError::ScriptWriteFailed { .. })) => {
            warn!(error = %e, "Script never started; marking execution skipped");
            ExecutionOutcome::skipped(e.to_string())
        }
    }
}

fn provision_failure_message(error: &ProvisionError) -> String {
    format!("dependency provisioning failed: {error}")
}
