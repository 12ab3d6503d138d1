//! Action output surface
//!
//! Three outputs per run: the full result as a JSON blob, the path of
//! the persisted script when one exists, and the boolean pass/fail.
//! Written to `GITHUB_OUTPUT` when the Actions runtime provides it,
//! otherwise to stdout so local invocations stay inspectable.

use std::io::Write;

use surfcheck_engine::RunReport;

/// Render the `name=value` output lines for one report.
///
/// The JSON blob is a single line; serde escapes any embedded newlines,
/// so the simple assignment form is always safe.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn render_outputs(report: &RunReport) -> std::io::Result<String> {
    let result_json = serde_json::to_string(report).map_err(std::io::Error::other)?;

    let mut lines = format!("result={result_json}\n");
    if let Some(path) = &report.script_path {
        lines.push_str(&format!("script-path={}\n", path.display()));
    }
    lines.push_str(&format!("passed={}\n", report.result.passed()));
    Ok(lines)
}

/// Write the outputs to `GITHUB_OUTPUT` or stdout.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_outputs(report: &RunReport) -> std::io::Result<()> {
    let lines = render_outputs(report)?;

    match std::env::var_os("GITHUB_OUTPUT") {
        Some(path) => {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            file.write_all(lines.as_bytes())
        }
        None => std::io::stdout().write_all(lines.as_bytes()),
    }
}
