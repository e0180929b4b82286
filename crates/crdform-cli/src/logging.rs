use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `CRDFORM_LOG=crdform_kube=debug`
pub const LOG_ENV: &str = "CRDFORM_LOG";

/// Initializes `tracing` logging to stderr with the filter from [`LOG_ENV`].
///
/// Without the variable only warnings are shown, or everything down to debug
/// when `debug` is set.
pub fn initialize_logging(debug: bool) {
    let default_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug);
    // A subscriber may already be installed when embedded in tests
    let _ = Registry::default().with(filter).with(fmt).try_init();
}
