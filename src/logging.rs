//! Log setup for the CLI.
//!
//! Output goes to stderr so reports written to stdout stay clean.
//! `RUST_LOG` takes precedence over the `-v` flags.

use anyhow::anyhow;
use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let default_level = level_for_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}
