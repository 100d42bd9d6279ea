//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and to `tower_http`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init(config: &ObservabilityConfig) {
    let _ = tracing_subscriber::registry()
        .with(filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "drift_gateway={level},tower_http={level}",
            level = config.log_level
        ))
    })
}
