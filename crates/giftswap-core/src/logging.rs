//! Structured logging for giftswap
//!
//! Thin setup over `tracing-subscriber`: an env-filtered fmt subscriber,
//! initialized at most once per process. `RUST_LOG` always wins over the
//! default level passed in, so reproducibility debugging (seed logging in
//! the draw stream) can be switched on without touching flags.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGING_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Initialize the global tracing subscriber.
///
/// `default_level` is a tracing filter directive (e.g. `"info"` or
/// `"giftswap_core=debug"`) used when `RUST_LOG` is unset. The filter is
/// built on the first call only; later calls are no-ops. Returns `true`
/// if this module's subscriber is the one installed, `false` if some
/// other subscriber was already in place (which is then kept).
pub fn init_logging(default_level: &str) -> bool {
    *LOGGING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        // Whatever the first call returned, repeated calls must settle
        // and never panic or reinstall.
        let first = init_logging("warn");
        let second = init_logging("debug");
        assert_eq!(first, second);
    }
}
