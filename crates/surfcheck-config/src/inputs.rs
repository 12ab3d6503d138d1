//! Raw Action inputs
//!
//! Each flag doubles as the `INPUT_*` environment variable GitHub
//! Actions injects for `with:` entries. Required-ness is enforced during
//! [`crate::Config::resolve`], not by clap, because Actions passes unset
//! inputs as empty strings rather than omitting them.

use clap::Parser;

/// surfcheck — generate and run LLM-authored UI tests for a pull request
#[derive(Debug, Clone, Parser)]
#[command(name = "surfcheck", version, about)]
pub struct RawInputs {
    /// Anthropic API key used for all LLM calls
    #[arg(long, env = "INPUT_ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// GitHub token used for REST calls and the result comment
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Free-text examples steering the style of generated tests
    #[arg(long, env = "INPUT_TEST_EXAMPLES")]
    pub test_examples: Option<String>,

    /// Directory the generated script is persisted under
    #[arg(long, env = "INPUT_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Wall-clock limit for executing the generated script, in seconds
    #[arg(long, env = "INPUT_TIMEOUT_SECONDS", default_value_t = 300)]
    pub timeout_seconds: u64,

    /// Whether to post the result as a PR comment
    #[arg(
        long,
        env = "INPUT_COMMENT_ON_PR",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub comment_on_pr: bool,

    /// Explicit preview URL; skips discovery entirely when set
    #[arg(long, env = "INPUT_BASE_URL")]
    pub base_url: Option<String>,

    /// How long to poll for a preview URL, in seconds
    #[arg(long, env = "INPUT_WAIT_FOR_PREVIEW", default_value_t = 0)]
    pub wait_for_preview: u64,

    /// Test-user email for generated login flows
    #[arg(long, env = "INPUT_TEST_USER_EMAIL", hide_env_values = true)]
    pub test_user_email: Option<String>,

    /// Test-user password for generated login flows
    #[arg(long, env = "INPUT_TEST_USER_PASSWORD", hide_env_values = true)]
    pub test_user_password: Option<String>,

    /// Verbose logging
    #[arg(long, env = "RUNNER_DEBUG", value_parser = truthy, default_value_t = false)]
    pub verbose: bool,
}

/// Mirrors the clap argument defaults, so fixtures built with struct
/// update syntax behave like an empty argv.
impl Default for RawInputs {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            github_token: None,
            test_examples: None,
            output_dir: None,
            timeout_seconds: 300,
            comment_on_pr: true,
            base_url: None,
            wait_for_preview: 0,
            test_user_email: None,
            test_user_password: None,
            verbose: false,
        }
    }
}

/// GitHub sets RUNNER_DEBUG to "1"; accept the usual truthy spellings.
fn truthy(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("not a boolean: {other}")),
    }
}
