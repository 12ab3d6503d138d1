//! surfcheck - generate and run LLM-authored UI tests for pull requests
//!
//! surfcheck is a GitHub Action binary. Given a pull request it asks an
//! LLM whether UI testing is warranted, generates a plan and a
//! browser-automation test script, executes that script against a
//! discovered or provided preview deployment, and posts the result as a
//! PR comment.
//!
//! The contract is "attempt to generate and surface tests", not "gate
//! merges on test results": failures intrinsic to the generated script
//! or the target application degrade to a skipped-or-classified report
//! and the process still exits 0. Only setup errors (bad inputs, wrong
//! event type) and collaborator failures during required stages (LLM or
//! GitHub unreachable while fetching context or generating) are fatal.
//!
//! # Workspace layout
//!
//! The root crate is a thin CLI over the member crates:
//!
//! - [`surfcheck_config`] — Action inputs and event context
//! - [`surfcheck_github`] — source-control collaborator and preview discovery
//! - [`surfcheck_llm`] — LLM collaborator (Anthropic Messages API)
//! - [`surfcheck_provision`] — runtime package and browser provisioning
//! - [`surfcheck_runner`] — script execution with streaming capture
//! - [`surfcheck_classify`] — pass/fail heuristics and case extraction
//! - [`surfcheck_redaction`] — credential redaction for captured output
//! - [`surfcheck_engine`] — the orchestrator tying it all together

pub mod cli;
pub mod outputs;

pub use surfcheck_classify as classify;
pub use surfcheck_config as config;
pub use surfcheck_engine as engine;
pub use surfcheck_github as github;
pub use surfcheck_llm as llm;
pub use surfcheck_provision as provision;
pub use surfcheck_redaction as redaction;
pub use surfcheck_runner as runner;
pub use surfcheck_utils as utils;

pub use surfcheck_engine::{Orchestrator, RunReport, RunResult};
pub use surfcheck_utils::{ExitCode, SurfCheckError};
