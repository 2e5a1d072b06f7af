use tracing_subscriber::EnvFilter;

/// Initializes structured logging.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies (for example
/// `info` or `reconcile_framework=debug`). Output is compact and omits
/// targets.
///
/// Calling this more than once is harmless: only the first call installs a
/// subscriber.
///
/// ```
/// reconcile_framework::tracing::setup_tracing("info");
/// tracing::info!("started");
/// ```
pub fn setup_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
