//! Tracing setup for surfcheck
//!
//! One subscriber for the whole process. Script narration from the child
//! process is forwarded line-by-line under the `surfcheck::script` target
//! so operators see progress in real time rather than only at the end.

use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Initialize the tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise defaults to `surfcheck=info`
/// (or `surfcheck=debug` with `verbose`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("surfcheck=debug,info")
            } else {
                EnvFilter::try_new("surfcheck=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Forward one line of child-process stdout to the log sink.
pub fn log_script_stdout(line: &str) {
    tracing::info!(target: "surfcheck::script", "{line}");
}

/// Forward one line of child-process stderr to the log sink.
pub fn log_script_stderr(line: &str) {
    tracing::warn!(target: "surfcheck::script", "{line}");
}
