use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when it is set.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_error_instead_of_panicking() {
        let _ = init_logging("debug");
        assert!(init_logging("info").is_err());
    }
}
