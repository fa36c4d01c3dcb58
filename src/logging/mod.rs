use crate::config::{LogFormat, LoggingConfig};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` refines the default filter.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::from_default_env().add_directive(
        "vaultgate=info"
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    if config.log_secrets {
        warn!("Secret logging is enabled: root tokens and key shares will be written to logs unredacted. Never enable this outside development.");
    }
}
