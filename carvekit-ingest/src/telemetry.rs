//! Tracing subscriber initialization.

use carvekit_core::{CarveResult, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "carvekit=info,warn";

/// Install the global subscriber. Logs go to stderr so stdout stays usable
/// for command output.
pub fn init_tracing(json: bool) -> CarveResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| {
        ConfigError::InvalidValue {
            field: "tracing".to_string(),
            value: if json { "json" } else { "text" }.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
