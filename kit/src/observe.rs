use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,trailhead_runtime=debug";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize a simple stdout tracing subscriber for development.
///
/// `RUST_LOG` overrides the default filter. Panics if a global subscriber is
/// already set; use [`try_init_stdout_tracing`] where that can happen.
pub fn init_stdout_tracing() {
    tracing_subscriber::fmt().with_env_filter(filter()).init();
}

/// Like [`init_stdout_tracing`], but leaves an existing subscriber in place.
pub fn try_init_stdout_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .try_init()
        .is_ok()
}
