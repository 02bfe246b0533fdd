//! Tracing subscriber setup.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber: JSON lines by default, the pretty
/// formatter when `pretty` is set.
pub fn init(level: &str, pretty: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("invalid log level '{level}'"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if pretty {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
