//! Run orchestration
//!
//! One polymorphic orchestrator over explicit collaborator interfaces,
//! sequencing context fetch, applicability, target discovery,
//! generation, execution, classification, and reporting. Failures in
//! the subject under test degrade the run; failures in required stages
//! (context fetch, generation) end it with a best-effort error comment.

use tracing::{info, warn};

use crate::applicability::check_applicability;
use crate::artifact::persist_script;
use crate::execute::{execute_script, execution_env};
use crate::generate::generate_test;
use crate::report::{render_comment, render_error_comment};
use crate::result::{ExecutionOutcome, RunReport, RunResult};

use surfcheck_classify::{CaseStatus, ClassificationStrategy, PhraseHeuristics, analyze_output, extract_cases};
use surfcheck_config::Config;
use surfcheck_github::{SourceControlClient, discover_preview_url};
use surfcheck_llm::LlmClient;
use surfcheck_provision::Provisioner;
use surfcheck_redaction::Sanitizer;
use surfcheck_runner::ScriptRunner;
use surfcheck_utils::error::SurfCheckError;

/// Drives one Action invocation end to end.
pub struct Orchestrator<S, L> {
    source: S,
    llm: L,
    config: Config,
    sanitizer: Sanitizer,
    provisioner: Provisioner,
    runner: ScriptRunner,
    strategy: Box<dyn ClassificationStrategy + Send + Sync>,
}

impl<S, L> Orchestrator<S, L>
where
    S: SourceControlClient,
    L: LlmClient,
{
    /// Assemble an orchestrator from its collaborators.
    ///
    /// The sanitizer is expected to be seeded with the configured secret
    /// literals so nothing the run captured can survive into a comment.
    #[must_use]
    pub fn new(source: S, llm: L, config: Config, sanitizer: Sanitizer) -> Self {
        Self {
            source,
            llm,
            config,
            sanitizer,
            provisioner: Provisioner::new(),
            runner: ScriptRunner::new(),
            strategy: Box::new(PhraseHeuristics),
        }
    }

    /// Override the script runner (test seam).
    #[must_use]
    pub fn with_runner(mut self, runner: ScriptRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Override the provisioner (test seam).
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Provisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Substitute the verdict strategy.
    #[must_use]
    pub fn with_strategy(
        mut self,
        strategy: Box<dyn ClassificationStrategy + Send + Sync>,
    ) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SurfCheckError`] only for failures of required stages:
    /// context fetch and generation. Everything downstream of generation
    /// degrades into the returned [`RunReport`] instead.
    pub async fn run(&self) -> Result<RunReport, SurfCheckError> {
        match self.run_pipeline().await {
            Ok(report) => Ok(report),
            Err(error) => {
                self.report_error(&error).await;
                Err(error)
            }
        }
    }

    async fn run_pipeline(&self) -> Result<RunReport, SurfCheckError> {
        let pr_number = self.config.pr_number;

        info!(pr = pr_number, repo = %self.config.repo, "Fetching pull request context");
        let pr = self.source.get_pull_request(pr_number).await?;
        let files = self.source.list_changed_files(pr_number).await?;

        let applicability = check_applicability(&self.llm, &pr, &files).await;
        if !applicability.applicable {
            info!(reason = %applicability.reason, "UI testing not applicable");
            let result = RunResult::Skipped {
                reason: format!("UI testing not applicable: {}", applicability.reason),
                cases: Vec::new(),
            };
            return self.finish(pr_number, result, None).await;
        }

        let preview = discover_preview_url(
            &self.source,
            &pr,
            self.config.base_url.as_deref(),
            self.config.wait_for_preview,
        )
        .await;
        let target_url = preview.as_ref().map(|p| p.url.as_str());

        let generated = generate_test(&self.llm, &self.config, &pr, &files, target_url).await?;

        let script_path = match &self.config.output_dir {
            Some(dir) => match persist_script(dir, pr_number, &generated.script) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Could not persist the generated script");
                    None
                }
            },
            None => None,
        };

        let mut cases = extract_cases(&generated.script);

        let result = match target_url {
            None => {
                info!("No preview URL; marking the generated test ready to run");
                mark_ready_to_run(&mut cases);
                RunResult::Skipped {
                    reason: "no preview URL was found within the wait window".to_string(),
                    cases,
                }
            }
            Some(url) => {
                let env = execution_env(&self.config, url);
                let outcome = execute_script(
                    &self.provisioner,
                    &self.runner,
                    &generated.script,
                    &env,
                    self.config.execution_timeout,
                )
                .await;

                if outcome.skipped {
                    mark_ready_to_run(&mut cases);
                    RunResult::Skipped {
                        reason: outcome
                            .error
                            .unwrap_or_else(|| "execution could not start".to_string()),
                        cases,
                    }
                } else {
                    // Classify against the raw text first; sanitize only
                    // what leaves the process.
                    let verdict =
                        self.strategy
                            .classify(&outcome.stdout, &outcome.stderr, outcome.exit_code);
                    let analysis = analyze_output(&mut cases, &outcome.stdout);
                    info!(?verdict, "Classified generated test run");
                    RunResult::Executed {
                        verdict,
                        cases,
                        analysis,
                        execution: self.sanitize_outcome(outcome),
                    }
                }
            }
        };

        self.finish(pr_number, result, script_path).await
    }

    /// Always attempt to post a result; a posting failure never changes
    /// the run's own status.
    async fn finish(
        &self,
        pr_number: u64,
        result: RunResult,
        script_path: Option<std::path::PathBuf>,
    ) -> Result<RunReport, SurfCheckError> {
        let report = RunReport {
            pr_number,
            result,
            script_path,
        };

        if self.config.comment_on_pr {
            let body = self.sanitizer.sanitize(&render_comment(&report));
            if let Err(e) = self.source.create_comment(pr_number, &body).await {
                warn!(error = %e, "Failed to post the result comment");
            }
        }

        Ok(report)
    }

    /// Best-effort error comment on the ERROR path.
    async fn report_error(&self, error: &SurfCheckError) {
        if !self.config.comment_on_pr {
            return;
        }
        let body = self.sanitizer.sanitize(&render_error_comment(error));
        if let Err(e) = self
            .source
            .create_comment(self.config.pr_number, &body)
            .await
        {
            warn!(error = %e, "Failed to post the error comment");
        }
    }

    fn sanitize_outcome(&self, outcome: ExecutionOutcome) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: self.sanitizer.sanitize(&outcome.stdout),
            stderr: self.sanitizer.sanitize(&outcome.stderr),
            error: outcome.error.map(|e| self.sanitizer.sanitize(&e)),
            ..outcome
        }
    }
}

fn mark_ready_to_run(cases: &mut [surfcheck_classify::TestCase]) {
    for case in cases {
        case.status = CaseStatus::ReadyToRun;
    }
}
