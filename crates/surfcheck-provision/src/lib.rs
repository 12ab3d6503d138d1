//! Dependency provisioning for generated test scripts
//!
//! Ensures the runtime packages and browser binaries a generated script
//! needs are present before the runner spawns it. Failure here is
//! reported as a typed error and the caller decides whether to degrade;
//! provisioning never aborts the run on its own.
//!
//! Re-running when everything is already installed is a cheap
//! resolvability probe per package, so `ensure` is idempotent in effect.

use std::ffi::OsString;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use surfcheck_runner::CommandSpec;
use surfcheck_utils::error::ProvisionError;

/// One runtime package a generated script imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// npm package name (e.g. "playwright")
    pub name: String,
    /// Optional pinned version
    pub version: Option<String>,
}

impl PackageSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    fn install_arg(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Default timeout for the package-manager install step.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Default timeout for the browser-binary install step.
const BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// Narrower browser target used for the single retry when the broad
/// install fails.
const FALLBACK_BROWSER: &str = "chromium";

/// Installs missing runtime packages and browser binaries.
#[derive(Debug, Clone)]
pub struct Provisioner {
    node: OsString,
    npm: OsString,
    npx: OsString,
    install_timeout: Duration,
    browser_timeout: Duration,
}

impl Provisioner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            node: OsString::from("node"),
            npm: OsString::from("npm"),
            npx: OsString::from("npx"),
            install_timeout: INSTALL_TIMEOUT,
            browser_timeout: BROWSER_TIMEOUT,
        }
    }

    /// Override the tool binaries (test seam).
    #[must_use]
    pub fn with_tools(
        mut self,
        node: impl Into<OsString>,
        npm: impl Into<OsString>,
        npx: impl Into<OsString>,
    ) -> Self {
        self.node = node.into();
        self.npm = npm.into();
        self.npx = npx.into();
        self
    }

    /// Override both step timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, install: Duration, browser: Duration) -> Self {
        self.install_timeout = install;
        self.browser_timeout = browser;
        self
    }

    /// Ensure every package in `packages` is resolvable, installing the
    /// missing ones and then the browser binaries they need.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::ToolMissing`] if npm is not on PATH
    /// - [`ProvisionError::InstallFailed`] / [`ProvisionError::InstallTimeout`]
    ///   for the package step
    /// - [`ProvisionError::BrowserInstallFailed`] when both the broad and
    ///   the narrowed browser install fail
    pub async fn ensure(&self, packages: &[PackageSpec]) -> Result<(), ProvisionError> {
        let mut missing = Vec::new();
        for package in packages {
            if self.is_resolvable(&package.name).await {
                debug!(package = %package.name, "Already resolvable, skipping install");
            } else {
                missing.push(package.clone());
            }
        }

        if missing.is_empty() {
            debug!("All runtime packages already resolvable");
            return Ok(());
        }

        which::which(&self.npm)
            .map_err(|_| ProvisionError::ToolMissing(self.npm.to_string_lossy().into_owned()))?;

        self.install_packages(&missing).await?;
        self.install_browsers().await
    }

    /// Probe whether the module is already resolvable by the runtime.
    async fn is_resolvable(&self, name: &str) -> bool {
        let spec = CommandSpec::new(&self.node)
            .arg("-e")
            .arg(format!("require.resolve('{name}')"));

        match run_quiet(spec, self.install_timeout).await {
            Ok(success) => success,
            Err(_) => false,
        }
    }

    async fn install_packages(&self, packages: &[PackageSpec]) -> Result<(), ProvisionError> {
        let names = packages
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        info!(packages = %names, "Installing runtime packages");

        let spec = CommandSpec::new(&self.npm)
            .args(["install", "--no-save"])
            .args(packages.iter().map(PackageSpec::install_arg));

        match run_quiet(spec, self.install_timeout).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProvisionError::InstallFailed {
                packages: names,
                reason: "npm install exited non-zero".to_string(),
            }),
            Err(RunOutcome::TimedOut) => Err(ProvisionError::InstallTimeout {
                packages: names,
                timeout_seconds: self.install_timeout.as_secs(),
            }),
            Err(RunOutcome::SpawnFailed(reason)) => {
                Err(ProvisionError::InstallFailed { packages: names, reason })
            }
        }
    }

    /// Install browser binaries, retrying once with a single named engine
    /// when the broad install fails.
    async fn install_browsers(&self) -> Result<(), ProvisionError> {
        info!("Installing browser binaries");

        let broad = CommandSpec::new(&self.npx).args(["playwright", "install"]);
        match run_quiet(broad, self.browser_timeout).await {
            Ok(true) => return Ok(()),
            Ok(false) => warn!("Broad browser install failed, retrying with {FALLBACK_BROWSER}"),
            Err(RunOutcome::TimedOut) => {
                warn!("Broad browser install timed out, retrying with {FALLBACK_BROWSER}");
            }
            Err(RunOutcome::SpawnFailed(reason)) => {
                return Err(ProvisionError::BrowserInstallFailed { reason });
            }
        }

        let narrow = CommandSpec::new(&self.npx).args(["playwright", "install", FALLBACK_BROWSER]);
        match run_quiet(narrow, self.browser_timeout).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProvisionError::BrowserInstallFailed {
                reason: format!("install of {FALLBACK_BROWSER} exited non-zero"),
            }),
            Err(RunOutcome::TimedOut) => Err(ProvisionError::BrowserInstallFailed {
                reason: format!(
                    "install of {FALLBACK_BROWSER} timed out after {}s",
                    self.browser_timeout.as_secs()
                ),
            }),
            Err(RunOutcome::SpawnFailed(reason)) => {
                Err(ProvisionError::BrowserInstallFailed { reason })
            }
        }
    }
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new()
    }
}

enum RunOutcome {
    TimedOut,
    SpawnFailed(String),
}

/// Run a command discarding its output, bounded by `timeout`.
///
/// Returns `Ok(true)` for exit 0, `Ok(false)` for non-zero.
async fn run_quiet(spec: CommandSpec, timeout: Duration) -> Result<bool, RunOutcome> {
    let mut command: Command = spec.to_tokio_command();
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| RunOutcome::SpawnFailed(e.to_string()))?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Ok(status.success()),
        Ok(Err(e)) => Err(RunOutcome::SpawnFailed(format!("wait failed: {e}"))),
        Err(_elapsed) => Err(RunOutcome::TimedOut),
    }
}
