use std::str::FromStr;

use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
};

/// Install the stderr subscriber. `RUST_LOG` overrides `default_level`.
pub fn init(default_level: &str) -> eyre::Result<()> {
    let level_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::from_str(default_level)?,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .pretty()
        .try_init()
        .map_err(|e| eyre::eyre!("installing tracing subscriber: {e}"))
}
