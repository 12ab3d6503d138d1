//! surfcheck CLI binary
//!
//! Minimal entrypoint; all logic lives in the library. cli::run handles
//! its own output and maps every handled outcome to exit 0.

#[tokio::main]
async fn main() {
    if let Err(code) = surfcheck::cli::run().await {
        std::process::exit(code.as_i32());
    }
}
