//! Tracing setup shared by the server and the report tool.

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when it parses, otherwise `default`.
pub fn log_filter(from_env: Option<&str>, default: &str) -> EnvFilter {
    from_env
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Installs a fmt subscriber writing to stderr, so report output on stdout
/// stays clean.
pub fn init_tracing(default: &str) {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(from_env.as_deref(), default))
        .with_writer(std::io::stderr)
        .init();
}
