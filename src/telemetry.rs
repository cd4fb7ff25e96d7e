//! Logging setup for the binaries.

/// Environment variable selecting the log format (`json` or anything else).
pub const LOG_FORMAT_ENV: &str = "HARAJ_LOG_FORMAT";

/// True when `HARAJ_LOG_FORMAT=json`.
#[must_use]
pub fn logs_are_json() -> bool {
    matches!(std::env::var(LOG_FORMAT_ENV).as_deref(), Ok("json"))
}

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Output goes to
/// stderr, compact text unless `HARAJ_LOG_FORMAT=json`. Calling this twice
/// is harmless.
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    if logs_are_json() {
        let _ = registry.with(fmt_layer.json().flatten_event(true)).try_init();
    } else {
        let _ = registry.with(fmt_layer.compact()).try_init();
    }
}
