use tracing_subscriber::EnvFilter;

/// Checked before `RUST_LOG`.
pub const LOG_ENV: &str = "CARDBATCH_LOG";
const DEFAULT_FILTER: &str = "warn";

fn resolve_env_filter() -> EnvFilter {
    if let Ok(level) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(level)
    {
        return filter;
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(resolve_env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
