//! Logging bootstrap for the command-line tool.
//!
//! # Invariants
//! - The logger is started at most once per process.
//! - Log output goes to stderr so stdout stays clean for listings and JSON.

use anyhow::{Result, anyhow, bail};
use flexi_logger::{Logger, LoggerHandle};
use log::debug;
use once_cell::sync::OnceCell;

static LOGGER: OnceCell<(&'static str, LoggerHandle)> = OnceCell::new();

/// Level used when neither `RUST_LOG` nor a flag asks for something else.
pub const DEFAULT_LEVEL: &str = "warn";

/// Start logging to stderr.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Calling again with
/// the same level is a no-op.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error
/// - logging was already started with another level
/// - the logger backend failed to start
pub fn init_logging(level: &str) -> Result<()> {
    let level = normalize_level(level)?;

    let (active, _) = LOGGER.get_or_try_init(|| -> Result<_> {
        let handle = Logger::try_with_env_or_str(level)
            .map_err(|err| anyhow!("invalid log level `{level}`: {err}"))?
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format)
            .start()
            .map_err(|err| anyhow!("failed to start logger: {err}"))?;
        debug!(
            "event=logging_init level={} version={}",
            level,
            env!("CARGO_PKG_VERSION")
        );
        Ok((level, handle))
    })?;

    if *active != level {
        bail!("logging already initialized with level `{active}`; refusing to switch to `{level}`");
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => bail!("unsupported log level `{other}`; expected trace|debug|info|warn|error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_normalized() {
        assert_eq!(normalize_level(" WARNING ").unwrap(), "warn");
        assert_eq!(normalize_level("Debug").unwrap(), "debug");
        assert!(normalize_level("loud").is_err());
    }
}
