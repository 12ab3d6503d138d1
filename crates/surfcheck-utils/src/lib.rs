//! Shared infrastructure for surfcheck
//!
//! This crate holds the pieces every other surfcheck crate leans on:
//! the error taxonomy, CLI exit-code mapping, and tracing initialization.

pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::{
    ConfigError, GithubError, LlmError, ProvisionError, ReportError, RunnerError, SurfCheckError,
};
pub use exit_codes::ExitCode;
pub use logging::init_tracing;
