//! Secure process execution specification

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

/// Specification for a command to execute.
///
/// All process execution goes through this type to ensure argv-style
/// invocation: arguments are `Vec<OsString>`, never shell strings, so
/// nothing a generated script or an LLM response contributes can be
/// interpreted by a shell.
///
/// # Example
///
/// ```rust
/// use surfcheck_runner::CommandSpec;
///
/// let cmd = CommandSpec::new("npm")
///     .args(["install", "--no-save", "playwright"])
///     .cwd("/workspace");
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
    /// Optional environment overrides, merged onto the ambient environment
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set one environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables for the child.
    #[must_use]
    pub fn envs<I, K, V>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let env_map = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in envs {
            env_map.insert(key.into(), value.into());
        }
        self
    }

    /// Convert into a `tokio::process::Command` for async execution.
    #[must_use]
    pub fn to_tokio_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let cmd = CommandSpec::new("node")
            .arg("--version")
            .args(["--input-type", "module"])
            .cwd("/workspace")
            .env("CI", "true")
            .envs([("BASE_URL", "http://localhost")]);

        assert_eq!(cmd.program, OsString::from("node"));
        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/workspace")));
        assert_eq!(cmd.env.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_shell_metacharacters_preserved_literally() {
        let cmd = CommandSpec::new("echo")
            .arg("$(whoami)")
            .arg("a;b|c&d")
            .arg("${HOME}");

        assert_eq!(cmd.args[0], OsString::from("$(whoami)"));
        assert_eq!(cmd.args[1], OsString::from("a;b|c&d"));
        assert_eq!(cmd.args[2], OsString::from("${HOME}"));
    }

    #[test]
    fn test_to_tokio_command_does_not_panic() {
        let cmd = CommandSpec::new("echo").arg("hello");
        let tokio_cmd = cmd.to_tokio_command();
        assert!(std::mem::size_of_val(&tokio_cmd) > 0);
    }
}
