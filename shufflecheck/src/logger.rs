// shufflecheck/src/logger.rs
//! Logger setup for the CLI. Safe to call more than once; only the first
//! call installs a logger.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "shufflecheck=info,shufflecheck_core=info,shufflecheck_stats=warn";

/// Initializes `env_logger` on stderr.
///
/// `Some(level)` forces that level for every target and ignores `RUST_LOG`;
/// `None` honours `RUST_LOG` and falls back to `DEFAULT_FILTER`.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = match level {
        Some(level) => {
            let mut builder = Builder::new();
            builder.filter_level(level);
            builder
        }
        None => Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER)),
    };

    builder.target(Target::Stderr).format_timestamp(None);
    let _ = builder.try_init();
}
