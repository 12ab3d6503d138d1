//! End-to-end pipeline scenarios with mocked collaborators
//!
//! The generated "script" in these tests is shell rather than Node so
//! the runner can execute it without a JavaScript toolchain; the
//! pipeline itself treats the script as an opaque string either way.

#![cfg(unix)]

use std::collections::VecDeque;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use surfcheck::classify::{CaseStatus, PassFail};
use surfcheck::config::{Config, EventContext, RawInputs};
use surfcheck::engine::{Orchestrator, RunResult};
use surfcheck::github::{ChangedFile, Comment, PullRequest, SourceControlClient};
use surfcheck::llm::{CompletionRequest, LlmClient};
use surfcheck::provision::Provisioner;
use surfcheck::redaction::Sanitizer;
use surfcheck::runner::ScriptRunner;
use surfcheck::utils::error::{GithubError, LlmError};

// --- mocks -------------------------------------------------------------

struct MockGithub {
    files: Vec<ChangedFile>,
    comments_posted: Arc<Mutex<Vec<String>>>,
}

impl MockGithub {
    fn new() -> Self {
        Self {
            files: vec![ChangedFile {
                path: "src/components/Login.tsx".into(),
                status: "modified".into(),
                additions: 8,
                deletions: 2,
                patch: Some("+ <LoginForm />".into()),
            }],
            comments_posted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the posted comments, kept by the test after the mock
    /// moves into the orchestrator.
    fn posted_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.comments_posted)
    }
}

#[async_trait]
impl SourceControlClient for MockGithub {
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, GithubError> {
        Ok(PullRequest {
            number,
            title: "Restyle the login page".into(),
            body: Some("New form layout".into()),
            head_sha: "abc123".into(),
            base_sha: "def456".into(),
            author: "octocat".into(),
        })
    }

    async fn list_changed_files(&self, _n: u64) -> Result<Vec<ChangedFile>, GithubError> {
        Ok(self.files.clone())
    }

    async fn list_comments(&self, _n: u64) -> Result<Vec<Comment>, GithubError> {
        Ok(Vec::new())
    }

    async fn create_comment(&self, _n: u64, body: &str) -> Result<(), GithubError> {
        self.comments_posted.lock().unwrap().push(body.to_string());
        Ok(())
    }

    async fn get_file_content(&self, _path: &str) -> Result<Option<String>, GithubError> {
        Ok(None)
    }

    async fn list_deployment_urls(&self, _sha: &str) -> Result<Vec<String>, GithubError> {
        Ok(Vec::new())
    }
}

struct ScriptedLlm(Mutex<VecDeque<Result<String, LlmError>>>);

impl ScriptedLlm {
    fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self(Mutex::new(responses.into()))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _req: CompletionRequest) -> Result<String, LlmError> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .expect("more LLM calls than scripted responses")
    }
}

// --- fixtures ----------------------------------------------------------

fn fake_tool(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    let mut perms = file.metadata().unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Provisioner whose resolvability probe succeeds, making ensure a no-op.
fn noop_provisioner(dir: &tempfile::TempDir) -> Provisioner {
    Provisioner::new().with_tools(
        fake_tool(dir, "node", "exit 0"),
        fake_tool(dir, "npm", "exit 0"),
        fake_tool(dir, "npx", "exit 0"),
    )
}

/// Provisioner where the probe, install, and browser steps all fail.
fn failing_provisioner(dir: &tempfile::TempDir) -> Provisioner {
    Provisioner::new().with_tools(
        fake_tool(dir, "node", "exit 1"),
        fake_tool(dir, "npm", "exit 1"),
        fake_tool(dir, "npx", "exit 1"),
    )
}

fn sh_runner(dir: &tempfile::TempDir) -> ScriptRunner {
    ScriptRunner::new()
        .with_interpreter("sh")
        .with_temp_dir(dir.path())
}

fn config(raw: RawInputs) -> Config {
    Config::resolve(
        RawInputs {
            anthropic_api_key: Some("sk-ant-test".to_string()),
            github_token: Some("ghs_test".to_string()),
            base_url: Some("http://127.0.0.1:1".to_string()),
            ..raw
        },
        EventContext {
            repo: "octo/widgets".to_string(),
            pr_number: 42,
        },
    )
    .unwrap()
}

/// Scripted LLM responses for a full run with an explicit base URL:
/// applicability, plan, navigation, then the given script in a fence.
fn full_conversation(script: &str) -> Vec<Result<String, LlmError>> {
    vec![
        Ok("YES\nThe login form changes.".to_string()),
        Ok("1. User can log in".to_string()),
        Ok("Scenario 1: start at the base URL".to_string()),
        Ok(format!("```javascript\n{script}\n```")),
    ]
}

// --- scenarios ---------------------------------------------------------

#[tokio::test]
async fn scenario_a_success_phrase_beats_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    let llm = ScriptedLlm::new(full_conversation(
        "echo \"All tests completed successfully\"; exit 1",
    ));

    let orch = Orchestrator::new(source, llm, config(RawInputs::default()), Sanitizer::new().unwrap())
        .with_provisioner(noop_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    match &report.result {
        RunResult::Executed { verdict, execution, .. } => {
            assert_eq!(*verdict, PassFail::Passed);
            assert!(execution.success);
            assert_eq!(execution.exit_code, Some(1));
        }
        other => panic!("expected Executed, got {other:?}"),
    }
    assert!(report.result.passed());
}

#[tokio::test]
async fn scenario_b_silent_zero_exit_passes() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    let llm = ScriptedLlm::new(full_conversation("exit 0"));

    let orch = Orchestrator::new(source, llm, config(RawInputs::default()), Sanitizer::new().unwrap())
        .with_provisioner(noop_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    match &report.result {
        RunResult::Executed { verdict, .. } => assert_eq!(*verdict, PassFail::Passed),
        other => panic!("expected Executed, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_failure_phrase_beats_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    let posted = source.posted_handle();
    let llm = ScriptedLlm::new(full_conversation(
        "echo \"ERROR: Test foo failed\"; exit 0",
    ));

    let orch = Orchestrator::new(source, llm, config(RawInputs::default()), Sanitizer::new().unwrap())
        .with_provisioner(noop_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    match &report.result {
        RunResult::Executed { verdict, .. } => assert_eq!(*verdict, PassFail::Failed),
        other => panic!("expected Executed, got {other:?}"),
    }
    // The run itself still counts as handled; only the verdict is failed.
    assert!(!report.result.passed());

    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].contains("❌"));
}

#[tokio::test]
async fn scenario_d_provision_failure_degrades_to_ready_to_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    // The script never runs (provisioning fails), so JavaScript-style
    // comments are safe even under the sh interpreter.
    let llm = ScriptedLlm::new(full_conversation(
        "// Test 1: user can log in with valid credentials\necho unreachable",
    ));

    let orch = Orchestrator::new(source, llm, config(RawInputs::default()), Sanitizer::new().unwrap())
        .with_provisioner(failing_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    match &report.result {
        RunResult::Skipped { reason, cases } => {
            assert!(reason.contains("provisioning failed"));
            assert_eq!(cases.len(), 1);
            assert_eq!(cases[0].name, "user can log in with valid credentials");
            assert!(cases.iter().all(|c| c.status == CaseStatus::ReadyToRun));
        }
        other => panic!("expected Skipped, got {other:?}"),
    }
    assert!(report.result.passed(), "a skipped run reports success");

    let json = serde_json::to_value(&report.result).unwrap();
    assert_eq!(json["status"], "skipped");
}

#[tokio::test]
async fn generated_script_receives_env_and_output_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    let posted = source.posted_handle();
    // The script narrates the configured test-user email; it must reach
    // classification raw but never survive into the comment or report.
    let llm = ScriptedLlm::new(full_conversation(
        "echo \"logging in as $TEST_USER_EMAIL\"\necho \"All tests completed successfully\"",
    ));

    let cfg = config(RawInputs {
        test_user_email: Some("qa.user@example.com".to_string()),
        test_user_password: Some("Tr0ub4dor&3".to_string()),
        ..RawInputs::default()
    });
    let sanitizer = Sanitizer::with_literals(&cfg.secret_literals()).unwrap();

    let orch = Orchestrator::new(source, llm, cfg, sanitizer)
        .with_provisioner(noop_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    match &report.result {
        RunResult::Executed { verdict, execution, .. } => {
            // Classification saw the success phrase despite the email on
            // the line above it.
            assert_eq!(*verdict, PassFail::Passed);
            // The stored outcome is already sanitized.
            assert!(!execution.stdout.contains("qa.user@example.com"));
            assert!(execution.stdout.contains("[REDACTED"));
        }
        other => panic!("expected Executed, got {other:?}"),
    }

    let posted = posted.lock().unwrap();
    assert_eq!(posted.len(), 1);
    assert!(!posted[0].contains("qa.user@example.com"));
}

#[tokio::test]
async fn generated_script_is_persisted_per_pr() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let source = MockGithub::new();
    let llm = ScriptedLlm::new(full_conversation("exit 0"));

    let cfg = config(RawInputs {
        output_dir: Some(out_dir.path().display().to_string()),
        ..RawInputs::default()
    });

    let orch = Orchestrator::new(source, llm, cfg, Sanitizer::new().unwrap())
        .with_provisioner(noop_provisioner(&dir))
        .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    let path = report.script_path.expect("script must be persisted");
    assert_eq!(path.file_name().unwrap(), "surfcheck-pr-42.spec.js");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "exit 0\n");
}

#[tokio::test]
async fn comment_posting_failure_does_not_change_the_outcome() {
    struct DeafGithub(MockGithub);

    #[async_trait]
    impl SourceControlClient for DeafGithub {
        async fn get_pull_request(&self, n: u64) -> Result<PullRequest, GithubError> {
            self.0.get_pull_request(n).await
        }
        async fn list_changed_files(&self, n: u64) -> Result<Vec<ChangedFile>, GithubError> {
            self.0.list_changed_files(n).await
        }
        async fn list_comments(&self, n: u64) -> Result<Vec<Comment>, GithubError> {
            self.0.list_comments(n).await
        }
        async fn create_comment(&self, _n: u64, _b: &str) -> Result<(), GithubError> {
            Err(GithubError::Api {
                status: 502,
                message: "bad gateway".into(),
            })
        }
        async fn get_file_content(&self, p: &str) -> Result<Option<String>, GithubError> {
            self.0.get_file_content(p).await
        }
        async fn list_deployment_urls(&self, s: &str) -> Result<Vec<String>, GithubError> {
            self.0.list_deployment_urls(s).await
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::new(full_conversation("exit 0"));

    let orch = Orchestrator::new(
        DeafGithub(MockGithub::new()),
        llm,
        config(RawInputs::default()),
        Sanitizer::new().unwrap(),
    )
    .with_provisioner(noop_provisioner(&dir))
    .with_runner(sh_runner(&dir));

    let report = orch.run().await.unwrap();
    assert!(report.result.passed());
}
