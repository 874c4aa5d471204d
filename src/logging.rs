use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{CatalogError, CatalogResult};

/// Install the console subscriber.
///
/// `RUST_LOG` wins when set; otherwise this crate logs at info (debug with
/// `verbose`) and everything else at warn.
pub fn init_logging(verbose: bool) -> CatalogResult<()> {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("core_catalog={},warn", level)));

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| CatalogError::configuration(format!("logging already initialized: {}", e)))
}
