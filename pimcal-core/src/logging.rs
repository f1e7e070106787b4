//! Logging bootstrap for applications embedding pimcal.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{PimError, PimResult};

/// Install a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `filter`. Returns `Ok(false)` when a global subscriber
/// is already installed.
pub fn init_logging(filter: &str) -> PimResult<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| PimError::Config(format!("Invalid log filter '{filter}': {e}")))?,
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok();

    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_a_noop() {
        let _ = init_logging("warn");
        assert!(!init_logging("warn").unwrap());
    }
}
