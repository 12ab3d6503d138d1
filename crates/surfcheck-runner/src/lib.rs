//! Script execution for surfcheck
//!
//! Runs generated test scripts as child processes: the script text is
//! persisted to a scoped temporary file, spawned with an explicit
//! environment overlay, streamed line-by-line into the host log, and
//! bounded by a wall-clock timeout with single-shot termination.
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure
//! argv-style invocation. Arguments cross trust boundaries as discrete
//! elements; no shell string evaluation is ever used.

pub mod command_spec;
pub mod script;

pub use command_spec::CommandSpec;
pub use script::{EnvOverlay, ScriptOutput, ScriptRunner};
pub use surfcheck_utils::error::RunnerError;
