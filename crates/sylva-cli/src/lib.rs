//! Shared helpers for the sylva binary

/// Initialize tracing for CLI binaries.
///
/// Uses RUST_LOG when set, defaulting to info level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
