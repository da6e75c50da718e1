//! Tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

/// Subscriber options
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryOptions {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Raise the default level to `debug`
    pub verbose: bool,
}

/// Install the global subscriber, writing to stderr
///
/// `RUST_LOG` overrides the default level. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init(options: TelemetryOptions) {
    let default_level = if options.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if options.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
