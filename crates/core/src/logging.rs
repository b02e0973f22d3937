//! Subscriber setup for hosts that embed the engine.
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the host's choice. `init` never panics when one is already installed.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Directive used when `RUST_LOG` is unset: the configured level for this
/// crate, warnings for everything else.
pub fn default_directive(config: &LoggingConfig) -> String {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    format!("warn,roicast_core={}", level.to_string().to_ascii_lowercase())
}

/// Installs a global fmt subscriber. Returns `false` when another subscriber
/// was already set, which leaves that subscriber in place.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(config)));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::{default_directive, init};
    use crate::config::{LogFormat, LoggingConfig};

    #[test]
    fn directive_scopes_level_to_this_crate() {
        let config = LoggingConfig { level: "DEBUG".to_owned(), format: LogFormat::Compact };
        assert_eq!(default_directive(&config), "warn,roicast_core=debug");

        let config = LoggingConfig { level: "chatty".to_owned(), format: LogFormat::Json };
        assert_eq!(default_directive(&config), "warn,roicast_core=info");
    }

    #[test]
    fn second_init_is_a_no_op() {
        let config = LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact };
        init(&config);
        assert!(!init(&config));
    }
}
