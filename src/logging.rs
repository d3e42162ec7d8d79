//! Log output for the `odc` binary.
//!
//! Records from the client core (emitted through `log`) are bridged into
//! the `tracing` subscriber installed here.  Output goes to stderr so it
//! never interleaves with rendered views on stdout.

use crate::error::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.  `RUST_LOG` wins over `level`.
pub fn init(level: &str, json: bool) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::Config(format!("invalid log level {:?}: {}", level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| AppError::Config(format!("logging already initialised: {}", e)))
}
