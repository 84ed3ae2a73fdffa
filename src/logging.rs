use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// The filter is taken from `RUST_LOG` when it is set and from the configured level otherwise.
/// Calling it again after a subscriber was installed does nothing.
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("A tracing subscriber is already installed");
    }
}
