//! Test generation conversation
//!
//! A strictly ordered sequence of LLM steps: plan, an optional
//! navigation step when a target URL exists, then code. Each step's
//! output feeds the next as context. No step is retried automatically;
//! a failure here is fatal to the run, unlike failures during execution.

use std::time::Duration;

use tracing::{debug, info};

use surfcheck_config::Config;
use surfcheck_github::{ChangedFile, PullRequest};
use surfcheck_llm::{CompletionRequest, LlmClient, LlmError, ModelTier};

/// Output of the generation conversation.
#[derive(Debug, Clone)]
pub struct GeneratedTest {
    /// The test plan produced by the first step
    pub plan: String,
    /// Route/navigation notes, present only when a target URL existed
    pub sitemap: Option<String>,
    /// The runnable script text
    pub script: String,
}

const PLAN_MAX_TOKENS: u32 = 2048;
const SITEMAP_MAX_TOKENS: u32 = 1024;
const CODE_MAX_TOKENS: u32 = 8192;

/// Per-step request timeout.
const STEP_TIMEOUT: Duration = Duration::from_secs(180);

/// Per-file cap on diff text included in prompts. Large patches past
/// this point add cost without adding signal.
const MAX_PATCH_CHARS: usize = 2000;

/// Run the generation conversation.
///
/// # Errors
///
/// Returns [`LlmError`] from any step, including [`LlmError::Malformed`]
/// when the code step yields no script.
pub async fn generate_test(
    llm: &dyn LlmClient,
    config: &Config,
    pr: &PullRequest,
    files: &[ChangedFile],
    target_url: Option<&str>,
) -> Result<GeneratedTest, LlmError> {
    let context = change_context(pr, files);

    info!(pr = pr.number, "Requesting test plan");
    let plan = llm
        .complete(
            CompletionRequest::new(plan_prompt(config, &context), PLAN_MAX_TOKENS, ModelTier::Capable)
                .with_system(
                    "You are a senior QA engineer. Produce a concise UI test plan for the \
                     change described: a numbered list of scenarios, each with the user-visible \
                     behavior to verify. Plan only what this change plausibly affects.",
                )
                .with_timeout(STEP_TIMEOUT),
        )
        .await?;
    debug!(chars = plan.len(), "Plan step completed");

    let sitemap = match target_url {
        Some(url) => {
            info!(url, "Requesting navigation notes for the preview target");
            let notes = llm
                .complete(
                    CompletionRequest::new(
                        sitemap_prompt(url, &plan),
                        SITEMAP_MAX_TOKENS,
                        ModelTier::Capable,
                    )
                    .with_system(
                        "You reason about how to reach each scenario of a web UI test plan \
                         from the application's entry URL. List the likely route or click \
                         path for each scenario. Be brief and concrete.",
                    )
                    .with_timeout(STEP_TIMEOUT),
                )
                .await?;
            debug!(chars = notes.len(), "Navigation step completed");
            Some(notes)
        }
        None => {
            debug!("No target URL; skipping the navigation step");
            None
        }
    };

    info!("Requesting test code");
    let response = llm
        .complete(
            CompletionRequest::new(
                code_prompt(config, &context, &plan, sitemap.as_deref(), target_url),
                CODE_MAX_TOKENS,
                ModelTier::Capable,
            )
            .with_system(code_system_prompt(config))
            .with_timeout(STEP_TIMEOUT),
        )
        .await?;

    let script = extract_script(&response)
        .ok_or_else(|| LlmError::Malformed("code step returned no script block".to_string()))?;
    debug!(chars = script.len(), "Code step completed");

    Ok(GeneratedTest {
        plan,
        sitemap,
        script,
    })
}

/// PR title, body, and a bounded diff summary shared by every step.
fn change_context(pr: &PullRequest, files: &[ChangedFile]) -> String {
    let mut context = format!(
        "Pull request #{}: {}\n\n{}\n\nChanged files:\n",
        pr.number,
        pr.title,
        pr.body.as_deref().unwrap_or("(no description)")
    );

    for file in files {
        context.push_str(&format!(
            "\n--- {} ({}, +{}/-{})\n",
            file.path, file.status, file.additions, file.deletions
        ));
        if let Some(patch) = &file.patch {
            context.push_str(&excerpt(patch, MAX_PATCH_CHARS));
            context.push('\n');
        }
    }

    context
}

fn plan_prompt(config: &Config, context: &str) -> String {
    let mut prompt = context.to_string();
    if let Some(examples) = &config.test_examples {
        prompt.push_str("\n\nMatch the style of these existing tests:\n");
        prompt.push_str(examples);
    }
    prompt.push_str("\n\nWrite the test plan for this change.");
    prompt
}

fn sitemap_prompt(url: &str, plan: &str) -> String {
    format!(
        "The application under test is deployed at {url}.\n\nTest plan:\n{plan}\n\n\
         For each scenario, describe how to reach it from that URL."
    )
}

fn code_system_prompt(config: &Config) -> String {
    let mut system = String::from(
        "You write browser-automation test scripts. Produce ONE self-contained Node.js \
         script using Playwright, in a single fenced code block and nothing else. \
         Requirements:\n\
         - read the application URL from the BASE_URL environment variable\n\
         - label each scenario with a `// Test N: description` comment\n\
         - narrate progress to stdout: `\u{25c6} [act] <action>` before each action and \
           `\u{2713} done` after it completes\n\
         - print `All tests completed successfully` at the end if every check passed, \
           or `Test suite failed` otherwise, and exit non-zero on failure",
    );
    if config.test_user.is_some() {
        system.push_str(
            "\n- for login flows, read credentials from the TEST_USER_EMAIL and \
             TEST_USER_PASSWORD environment variables; never hard-code them",
        );
    }
    system
}

fn code_prompt(
    config: &Config,
    context: &str,
    plan: &str,
    sitemap: Option<&str>,
    target_url: Option<&str>,
) -> String {
    let mut prompt = format!("{context}\n\nTest plan:\n{plan}\n");
    if let Some(notes) = sitemap {
        prompt.push_str(&format!("\nNavigation notes:\n{notes}\n"));
    }
    match target_url {
        Some(url) => prompt.push_str(&format!("\nThe deployment under test is {url}.\n")),
        None => prompt.push_str(
            "\nNo deployment URL is available yet; the script will run later against \
             BASE_URL.\n",
        ),
    }
    if let Some(examples) = &config.test_examples {
        prompt.push_str(&format!("\nStyle examples:\n{}\n", examples));
    }
    prompt.push_str("\nWrite the test script now.");
    prompt
}

/// Pull the script out of the response.
///
/// The first fenced code block wins, whatever its language tag. A
/// response with no fence at all is accepted verbatim only when it
/// plainly reads as code rather than prose.
fn extract_script(response: &str) -> Option<String> {
    let mut in_fence = false;
    let mut block = String::new();

    for line in response.lines() {
        if line.trim_start().starts_with("```") {
            if in_fence {
                return Some(block);
            }
            in_fence = true;
            continue;
        }
        if in_fence {
            block.push_str(line);
            block.push('\n');
        }
    }

    if in_fence {
        // Unterminated fence; take what arrived before the cutoff.
        return Some(block);
    }

    let trimmed = response.trim();
    if !trimmed.is_empty()
        && (trimmed.contains("require(") || trimmed.contains("import ") || trimmed.contains("=>"))
    {
        return Some(trimmed.to_string());
    }

    None
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}\n[patch truncated]")
}
