//! Applicability check
//!
//! Asks the LLM whether the change plausibly affects user-facing
//! behavior; an inconclusive or failed response falls back to a
//! deterministic path allow-list. The run never blocks solely on an
//! unreachable LLM.

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use std::time::Duration;
use tracing::{debug, warn};

use surfcheck_github::{ChangedFile, PullRequest};
use surfcheck_llm::{CompletionRequest, LlmClient, ModelTier};

/// Paths that make a change UI-relevant when the LLM cannot decide:
/// component/page/style directories and common front-end suffixes.
static UI_PATHS: Lazy<GlobSet> = Lazy::new(|| {
    let mut builder = GlobSetBuilder::new();
    for pattern in [
        "**/components/**",
        "**/pages/**",
        "**/views/**",
        "**/layouts/**",
        "**/styles/**",
        "**/*.tsx",
        "**/*.jsx",
        "**/*.vue",
        "**/*.svelte",
        "**/*.html",
        "**/*.css",
        "**/*.scss",
    ] {
        builder.add(Glob::new(pattern).expect("valid glob"));
    }
    builder.build().expect("valid glob set")
});

/// Verdict of the applicability stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicability {
    pub applicable: bool,
    pub reason: String,
}

/// Decide whether UI testing is warranted for this PR.
pub async fn check_applicability(
    llm: &dyn LlmClient,
    pr: &PullRequest,
    files: &[ChangedFile],
) -> Applicability {
    let prompt = applicability_prompt(pr, files);
    let request = CompletionRequest::new(prompt, 256, ModelTier::Fast)
        .with_system(
            "You decide whether a pull request plausibly affects user-facing web UI behavior. \
             Answer with exactly YES or NO on the first line, then one short sentence of rationale.",
        )
        .with_timeout(Duration::from_secs(60));

    match llm.complete(request).await {
        Ok(response) => match parse_verdict(&response) {
            Some(applicable) => {
                debug!(applicable, "LLM applicability verdict");
                Applicability {
                    applicable,
                    reason: rationale(&response),
                }
            }
            None => {
                warn!("Inconclusive applicability response, using path fallback");
                path_fallback(files)
            }
        },
        Err(e) => {
            warn!(error = %e, "Applicability check unavailable, using path fallback");
            path_fallback(files)
        }
    }
}

fn applicability_prompt(pr: &PullRequest, files: &[ChangedFile]) -> String {
    let mut prompt = format!(
        "Pull request: {}\n\n{}\n\nChanged files:\n",
        pr.title,
        pr.body.as_deref().unwrap_or("(no description)")
    );
    for file in files {
        prompt.push_str(&format!(
            "- {} ({}, +{}/-{})\n",
            file.path, file.status, file.additions, file.deletions
        ));
    }
    prompt.push_str("\nDoes this change plausibly affect user-facing UI behavior?");
    prompt
}

/// First YES/NO token wins; anything else is inconclusive.
fn parse_verdict(response: &str) -> Option<bool> {
    let first_line = response.trim().lines().next()?.trim().to_uppercase();
    if first_line.starts_with("YES") {
        Some(true)
    } else if first_line.starts_with("NO") {
        Some(false)
    } else {
        None
    }
}

fn rationale(response: &str) -> String {
    response
        .trim()
        .lines()
        .nth(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("LLM applicability check")
        .to_string()
}

/// Deterministic fallback over the changed-file paths.
fn path_fallback(files: &[ChangedFile]) -> Applicability {
    let matched: Vec<&str> = files
        .iter()
        .map(|f| f.path.as_str())
        .filter(|p| UI_PATHS.is_match(p))
        .collect();

    if matched.is_empty() {
        Applicability {
            applicable: false,
            reason: "no changed file matches the UI path allow-list".to_string(),
        }
    } else {
        Applicability {
            applicable: true,
            reason: format!("UI-relevant paths changed: {}", matched.join(", ")),
        }
    }
}
