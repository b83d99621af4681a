//! Process-wide log verbosity.
//!
//! Logs go to stderr: stdout of a trial process is its result channel. The
//! subscriber is installed on first use; later calls swap its filter in place.

use std::sync::OnceLock;

use ft_types::{config_error, FtResult};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Environment variable read by [`init_from_env`], in `EnvFilter` syntax.
pub const LOG_ENV: &str = "FORKTUNE_LOG";

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Emit events at `level` and above. `INFO` shows run start and finish, `DEBUG`
/// adds the simplex and every trial objective. May be called any number of times.
pub fn set_log_level(level: LevelFilter) -> FtResult<()> {
    apply(EnvFilter::default().add_directive(level.into()))
}

/// Configure the filter from [`LOG_ENV`], defaulting to `warn`.
pub fn init_from_env() -> FtResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    apply(filter)
}

fn apply(filter: EnvFilter) -> FtResult<()> {
    if let Some(handle) = FILTER.get() {
        return handle
            .reload(filter)
            .map_err(|e| config_error!("cannot change log filter: {e}"));
    }

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| config_error!("another global subscriber is installed: {e}"))?;
    let _ = FILTER.set(handle);
    Ok(())
}
