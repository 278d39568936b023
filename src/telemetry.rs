//! Tracing subscriber setup shared by every binary.

use tracing_subscriber::EnvFilter;

fn filter(default_directive: &str) -> EnvFilter {
    // RUST_LOG wins; otherwise the binary's default, with noisy deps quieted.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_directive},sqlx=warn,aws_config=warn"))
    })
}

/// Human-readable logs for interactive commands and the web server.
pub fn init_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_target(true)
        .init();
}

/// Logs for function runtimes: no colours and no timestamps, the log sink
/// adds its own.
pub fn init_function_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();
}
