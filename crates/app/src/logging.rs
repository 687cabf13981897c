use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::BridgeConfig;

/// Filter directive for the bridge crates at the configured level.
pub fn filter_directive(config: &BridgeConfig) -> String {
    let level = if config.debug {
        "debug".to_string()
    } else {
        config.log_level.to_ascii_lowercase()
    };
    ["bridge_app", "app_api", "monitor_upstream", "monitor_reader"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level;
/// a second call is a no-op.
pub fn init(config: &BridgeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_overrides_level() {
        let mut config = BridgeConfig {
            log_level: "WARN".to_string(),
            ..BridgeConfig::default()
        };
        assert!(filter_directive(&config).contains("bridge_app=warn"));
        config.debug = true;
        assert!(filter_directive(&config).contains("monitor_reader=debug"));
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = BridgeConfig::default();
        init(&config);
        init(&config);
    }
}
