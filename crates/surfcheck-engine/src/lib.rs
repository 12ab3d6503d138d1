//! Run orchestration for surfcheck
//!
//! Wires the collaborators together: fetch PR context, decide whether
//! UI testing is warranted, find a preview target, generate a test
//! script, execute it, classify the outcome, and report. The engine
//! owns the degradation policy: failures intrinsic to the subject under
//! test never fail the Action, failures of its own control plane do.

mod applicability;
mod artifact;
mod execute;
mod generate;
mod orchestrator;
mod report;
mod result;

pub use applicability::{Applicability, check_applicability};
pub use artifact::persist_script;
pub use execute::{execute_script, execution_env};
pub use generate::{GeneratedTest, generate_test};
pub use orchestrator::Orchestrator;
pub use report::{render_comment, render_error_comment};
pub use result::{ExecutionOutcome, RunReport, RunResult};
