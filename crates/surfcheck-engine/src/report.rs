//! PR comment rendering
//!
//! Turns a [`RunReport`] into the markdown body posted on the pull
//! request. Callers sanitize the rendered body before it leaves the
//! process; nothing here assumes its inputs are already clean.

use chrono::Utc;

use crate::result::{RunReport, RunResult};
use surfcheck_classify::{CaseStatus, OutputAnalysis, PassFail, TestCase};
use surfcheck_utils::error::SurfCheckError;

/// Tail of captured output shown in the collapsible excerpt.
const OUTPUT_EXCERPT_CHARS: usize = 3000;

/// Render the result comment for one run.
#[must_use]
pub fn render_comment(report: &RunReport) -> String {
    let mut body = String::from("## Generated UI test report\n\n");

    match &report.result {
        RunResult::Skipped { reason, cases } => {
            body.push_str(&format!("**Execution skipped** — {reason}\n\n"));
            if cases.is_empty() {
                body.push_str("No test script was generated for this change.\n");
            } else {
                body.push_str(
                    "A test script was generated and is ready to run once the blocker above \
                     is resolved.\n\n",
                );
                body.push_str(&case_table(cases));
            }
        }
        RunResult::Executed {
            verdict,
            cases,
            analysis,
            execution,
        } => {
            body.push_str(&verdict_line(*verdict));
            body.push('\n');
            if let Some(error) = &execution.error {
                body.push_str(&format!("\n> {error}\n"));
            }
            body.push('\n');
            body.push_str(&case_table(cases));
            body.push('\n');
            body.push_str(&analysis_section(analysis));
            body.push_str(&output_excerpt(&execution.stdout, &execution.stderr));
        }
        RunResult::Failed { error } => {
            body.push_str(&format!(
                "**The test run could not complete.**\n\n```\n{error}\n```\n"
            ));
        }
    }

    if let Some(path) = &report.script_path {
        body.push_str(&format!("\nGenerated script: `{}`\n", path.display()));
    }

    body.push_str(&footer());
    body
}

/// Render the best-effort comment posted when a required stage fails.
#[must_use]
pub fn render_error_comment(error: &SurfCheckError) -> String {
    let mut body = String::from("## Generated UI test report\n\n");
    body.push_str("**The test run failed before producing a result.**\n\n");
    body.push_str(&format!("```\n{}\n```\n", error.display_for_user()));
    body.push_str(
        "\nThis does not block the pull request; re-run the workflow once the cause is \
         addressed.\n",
    );
    body.push_str(&footer());
    body
}

fn verdict_line(verdict: PassFail) -> String {
    match verdict {
        PassFail::Passed => "**Verdict: ✅ passed**\n".to_string(),
        PassFail::Failed => "**Verdict: ❌ failed**\n".to_string(),
    }
}

fn case_table(cases: &[TestCase]) -> String {
    let mut table = String::from("| # | Test case | Status |\n|---|-----------|--------|\n");
    for (index, case) in cases.iter().enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            index + 1,
            case.name.replace('|', "\\|"),
            status_label(case.status)
        ));
    }
    table
}

fn status_label(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Generated => "generated",
        CaseStatus::ReadyToRun => "ready to run",
        CaseStatus::Passed => "✅ passed",
        CaseStatus::Failed => "❌ failed",
        CaseStatus::Unknown => "unknown",
    }
}

fn analysis_section(analysis: &OutputAnalysis) -> String {
    format!(
        "**Run analysis:** {} action(s) started, {} completed, {} failure marker(s) in the \
         narration.\n",
        analysis.actions_started, analysis.actions_completed, analysis.failure_tally
    )
}

fn output_excerpt(stdout: &str, stderr: &str) -> String {
    let mut combined = String::new();
    if !stdout.trim().is_empty() {
        combined.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        if !combined.is_empty() {
            combined.push_str("\n--- stderr ---\n");
        }
        combined.push_str(stderr.trim_end());
    }
    if combined.is_empty() {
        return String::new();
    }

    let tail = tail_chars(&combined, OUTPUT_EXCERPT_CHARS);
    format!("\n<details>\n<summary>Script output</summary>\n\n```\n{tail}\n```\n\n</details>\n")
}

fn tail_chars(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let skipped: String = text.chars().skip(count - max_chars).collect();
    format!("[...]\n{skipped}")
}

fn footer() -> String {
    format!(
        "\n---\n_Generated by surfcheck at {}._\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ExecutionOutcome;
    use surfcheck_utils::error::LlmError;

    fn case(name: &str, status: CaseStatus) -> TestCase {
        TestCase {
            name: name.to_string(),
            status,
            line: 1,
        }
    }

    #[test]
    fn test_skipped_report_lists_ready_cases() {
        let report = RunReport {
            pr_number: 42,
            result: RunResult::Skipped {
                reason: "dependency provisioning failed: npm missing".to_string(),
                cases: vec![case("user can log in", CaseStatus::ReadyToRun)],
            },
            script_path: Some("/artifacts/surfcheck-pr-42.spec.js".into()),
        };

        let body = render_comment(&report);
        assert!(body.contains("Execution skipped"));
        assert!(body.contains("npm missing"));
        assert!(body.contains("ready to run"));
        assert!(body.contains("surfcheck-pr-42.spec.js"));
    }

    #[test]
    fn test_skipped_without_script_notes_absence() {
        let report = RunReport {
            pr_number: 42,
            result: RunResult::Skipped {
                reason: "UI testing not applicable".to_string(),
                cases: vec![],
            },
            script_path: None,
        };

        let body = render_comment(&report);
        assert!(body.contains("No test script was generated"));
    }

    #[test]
    fn test_executed_report_includes_verdict_table_and_output() {
        let report = RunReport {
            pr_number: 42,
            result: RunResult::Executed {
                verdict: PassFail::Passed,
                cases: vec![
                    case("user can log in", CaseStatus::Passed),
                    case("dashboard renders", CaseStatus::Generated),
                ],
                analysis: OutputAnalysis {
                    actions_started: 2,
                    actions_completed: 1,
                    failure_tally: 0,
                },
                execution: ExecutionOutcome {
                    success: true,
                    stdout: "◆ [act] navigating\n✓ done\n".to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                    skipped: false,
                    error: None,
                },
            },
            script_path: None,
        };

        let body = render_comment(&report);
        assert!(body.contains("✅ passed"));
        assert!(body.contains("| 1 | user can log in |"));
        assert!(body.contains("2 action(s) started, 1 completed"));
        assert!(body.contains("<details>"));
        assert!(body.contains("◆ [act] navigating"));
    }

    #[test]
    fn test_pipe_in_case_name_escaped() {
        let report = RunReport {
            pr_number: 1,
            result: RunResult::Skipped {
                reason: "r".to_string(),
                cases: vec![case("a | b", CaseStatus::ReadyToRun)],
            },
            script_path: None,
        };
        assert!(render_comment(&report).contains("a \\| b"));
    }

    #[test]
    fn test_long_output_truncated_from_the_front() {
        let tail = tail_chars(&"x".repeat(5000), 100);
        assert!(tail.starts_with("[...]"));
        assert_eq!(tail.chars().filter(|c| *c == 'x').count(), 100);
    }

    #[test]
    fn test_error_comment_carries_hint() {
        let error = SurfCheckError::from(LlmError::Auth("provider rejected".to_string()));
        let body = render_error_comment(&error);
        assert!(body.contains("failed before producing a result"));
        assert!(body.contains("anthropic-api-key"));
        assert!(body.contains("does not block the pull request"));
    }
}
