//! Generated-script execution
//!
//! State machine per run: created → running → completed | timed out |
//! failed. The script file is a scoped resource removed on every exit
//! path, including when the process never starts.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::CommandSpec;
use surfcheck_utils::error::RunnerError;
use surfcheck_utils::logging::{log_script_stderr, log_script_stdout};

/// Environment overlay injected into the child process.
///
/// Passed explicitly into the spawn call and merged onto the ambient
/// environment there; the parent's environment is never mutated.
pub type EnvOverlay = HashMap<String, String>;

/// Accumulated output of a completed (exit 0) script run.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// How long to wait for the child to honor the terminate signal before
/// the kill-on-drop backstop reclaims it.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// Runs generated scripts through an interpreter with streaming capture.
///
/// No retries happen here; the degrade policy lives in the engine.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: OsString,
    temp_dir: Option<PathBuf>,
}

impl ScriptRunner {
    /// Runner invoking the default `node` interpreter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interpreter: OsString::from("node"),
            temp_dir: None,
        }
    }

    /// Override the interpreter binary.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: impl Into<OsString>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Place script files under a specific directory instead of the
    /// system temp dir.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Execute `script` with the given environment overlay and timeout.
    ///
    /// stdout and stderr are consumed incrementally as they arrive, each
    /// line forwarded to the host log immediately, so operators see
    /// progress in real time.
    ///
    /// # Errors
    ///
    /// - [`RunnerError::ScriptWriteFailed`] if the script cannot be persisted
    /// - [`RunnerError::SpawnFailed`] if the interpreter cannot start
    /// - [`RunnerError::Timeout`] after one terminate signal at the deadline
    /// - [`RunnerError::ExitFailure`] for a non-zero exit, with the
    ///   accumulated output attached
    pub async fn run(
        &self,
        script: &str,
        env: &EnvOverlay,
        timeout: Duration,
    ) -> Result<ScriptOutput, RunnerError> {
        // Scoped resource: deleted on drop along every path below.
        let script_file = self.persist_script(script)?;

        let spec = CommandSpec::new(&self.interpreter)
            .arg(script_file.path())
            .envs(env.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut command = spec.to_tokio_command();
        command
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed {
            reason: e.to_string(),
        })?;

        debug!(
            interpreter = %self.interpreter.to_string_lossy(),
            timeout_secs = timeout.as_secs(),
            "Spawned generated script"
        );

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));

        let stdout_task = stream_lines(
            BufReader::new(child.stdout.take().expect("stdout is piped")),
            Arc::clone(&stdout_buf),
            log_script_stdout,
        );
        let stderr_task = stream_lines(
            BufReader::new(child.stderr.take().expect("stderr is piped")),
            Arc::clone(&stderr_buf),
            log_script_stderr,
        );

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                return Err(RunnerError::SpawnFailed {
                    reason: format!("wait failed: {e}"),
                });
            }
            Err(_elapsed) => {
                // Single-shot termination; the script is trusted to exit
                // promptly on signal delivery, and kill-on-drop reclaims
                // it if that trust is misplaced.
                terminate(&mut child);
                let _ = tokio::time::timeout(TERM_GRACE, child.wait()).await;
                let _ = tokio::time::timeout(TERM_GRACE, stdout_task).await;
                let _ = tokio::time::timeout(TERM_GRACE, stderr_task).await;

                return Err(RunnerError::Timeout {
                    timeout_seconds: timeout.as_secs(),
                    stdout: snapshot(&stdout_buf),
                    stderr: snapshot(&stderr_buf),
                });
            }
        };

        // The process has exited but the pipes may still hold buffered
        // lines; drain both readers to EOF before returning.
        let _ = stdout_task.await;
        let _ = stderr_task.await;

        let stdout = snapshot(&stdout_buf);
        let stderr = snapshot(&stderr_buf);
        let exit_code = status.code();

        match exit_code {
            Some(0) => Ok(ScriptOutput {
                stdout,
                stderr,
                exit_code,
            }),
            code => Err(RunnerError::ExitFailure {
                code: code.unwrap_or(-1),
                stdout,
                stderr,
            }),
        }
    }

    /// Persist the script text to a throwaway file.
    fn persist_script(&self, script: &str) -> Result<NamedTempFile, RunnerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("surfcheck-").suffix(".spec.js");

        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| RunnerError::ScriptWriteFailed {
            reason: e.to_string(),
        })?;

        file.write_all(script.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| RunnerError::ScriptWriteFailed {
                reason: e.to_string(),
            })?;

        Ok(file)
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn stream_lines<R>(
    reader: BufReader<R>,
    buffer: Arc<Mutex<String>>,
    forward: fn(&str),
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            forward(&line);
            let mut buf = buffer.lock().expect("output buffer poisoned");
            buf.push_str(&line);
            buf.push('\n');
        }
    })
}

fn snapshot(buffer: &Arc<Mutex<String>>) -> String {
    buffer.lock().expect("output buffer poisoned").clone()
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    } else {
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh_runner(dir: &tempfile::TempDir) -> ScriptRunner {
        ScriptRunner::new()
            .with_interpreter("sh")
            .with_temp_dir(dir.path())
    }

    fn dir_entry_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_successful_run_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = sh_runner(&dir)
            .run("echo hello; echo oops >&2", &EnvOverlay::new(), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(dir_entry_count(&dir), 0, "script file must be removed");
    }

    #[tokio::test]
    async fn test_env_overlay_reaches_child() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = EnvOverlay::new();
        env.insert("SURFCHECK_BASE_URL".to_string(), "http://preview".to_string());

        let out = sh_runner(&dir)
            .run("echo $SURFCHECK_BASE_URL", &env, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(out.stdout, "http://preview\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_accumulated_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = sh_runner(&dir)
            .run("echo partial; exit 3", &EnvOverlay::new(), Duration::from_secs(10))
            .await
            .unwrap_err();

        match err {
            RunnerError::ExitFailure {
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(code, 3);
                assert_eq!(stdout, "partial\n");
                assert_eq!(stderr, "");
            }
            other => panic!("expected ExitFailure, got {other:?}"),
        }
        assert_eq!(dir_entry_count(&dir), 0, "script file must be removed");
    }

    #[tokio::test]
    async fn test_timeout_terminates_child_within_epsilon() {
        let dir = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let err = sh_runner(&dir)
            .run(
                "echo before; sleep 30; echo after",
                &EnvOverlay::new(),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();

        assert!(
            started.elapsed() < Duration::from_secs(5),
            "timeout must resolve promptly"
        );
        match err {
            RunnerError::Timeout {
                timeout_seconds,
                stdout,
                ..
            } => {
                assert_eq!(timeout_seconds, 1);
                assert_eq!(stdout, "before\n");
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert_eq!(dir_entry_count(&dir), 0, "script file must be removed");
    }

    #[tokio::test]
    async fn test_spawn_failure_removes_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptRunner::new()
            .with_interpreter("/nonexistent/interpreter")
            .with_temp_dir(dir.path());

        let err = runner
            .run("echo never", &EnvOverlay::new(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::SpawnFailed { .. }));
        assert_eq!(
            dir_entry_count(&dir),
            0,
            "script file must be removed even when the process never starts"
        );
    }
}
