use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::remuneraciones::tools::error::{Result, ToolError};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. Events go to stderr, or are appended to
/// `log_file` when one is given. `RUST_LOG` overrides the default level.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|err| ToolError::Logging(err.to_string()))
}

#[cfg(test)]
pub(crate) use capture::capture_logs;
