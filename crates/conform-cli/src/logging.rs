//! Log subscriber setup.
//!
//! Logs go to stderr. `RUST_LOG` wins over the verbosity flags.

use crate::config::CliConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber once
pub fn init_logging(config: &CliConfig) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let directive = config.verbosity.log_directive();
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(config.color.should_color())
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
