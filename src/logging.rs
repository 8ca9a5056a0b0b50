//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "quill=info";

/// Default for interactive runs, where the spinner owns stderr.
pub const QUIET_FILTER: &str = "quill=warn";

/// Install the global subscriber. Logs go to stderr so generated text on
/// stdout stays clean. `json` switches to one JSON object per line.
/// Calling this twice is harmless.
pub fn init(json: bool) {
    init_with(DEFAULT_FILTER, json);
}

/// Like [`init`] with a different fallback filter.
pub fn init_with(default_filter: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
    };
}
