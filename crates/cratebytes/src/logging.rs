//! Log output setup.
//!
//! The SDK logs through `tracing` everywhere. Applications that already
//! install a subscriber get SDK events for free; others can call
//! [`init_logging`].

use tracing_subscriber::EnvFilter;

use crate::SdkConfig;

/// Filter used when `RUST_LOG` is unset: SDK crates at `info`, the rest
/// at `warn`.
pub const DEFAULT_LOG_FILTER: &str = "warn,cratebytes=info,cratebytes_session=info,\
cratebytes_protocol=info,cratebytes_transport=info,cratebytes_tick=info";

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default
/// [`DEFAULT_LOG_FILTER`]) when `config.enable_logging` is set.
///
/// Returns `true` if a subscriber was installed. Does nothing, and
/// returns `false`, when logging is disabled or a global subscriber is
/// already set.
pub fn init_logging(config: &SdkConfig) -> bool {
    if !config.enable_logging {
        return false;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logging_installs_nothing() {
        assert!(!init_logging(&SdkConfig::default()));
    }
}
