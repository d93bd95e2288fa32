//! Console logging via `tracing`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable consulted when no level is passed on the command line
pub const LOG_ENV: &str = "QUOTEBOOK_LOG";

const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directive: explicit level, then `QUOTEBOOK_LOG`, then `warn`.
pub fn resolve_level(explicit: Option<&str>) -> String {
    let given = |level: &String| !level.trim().is_empty();
    explicit
        .map(str::to_string)
        .filter(given)
        .or_else(|| std::env::var(LOG_ENV).ok().filter(given))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install the global subscriber writing compact lines to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
