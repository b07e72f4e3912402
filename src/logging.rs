use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogArgs, LogFormat};

/// Installs the global subscriber. `RUST_LOG` wins over `--log-level`.
///
/// Returns an error if a global subscriber is already set.
pub fn init(args: &LogArgs) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.level))?;

    let registry = tracing_subscriber::registry().with(filter);

    match args.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_ansi(false))
            .try_init()?,
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false))
            .try_init()?,
    }

    Ok(())
}
