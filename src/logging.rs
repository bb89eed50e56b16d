//! Tracing subscriber setup for the binary.
//!
//! `RUST_LOG` wins when set; otherwise the level is `warn`, or `debug`
//! for this crate with `--verbose`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
}

pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "warn,studio=debug" } else { "warn" }
}

/// Install the global subscriber. Logs go to stderr so command output
/// stays clean. Calling twice is a no-op.
pub fn init(options: LogOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if options.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
