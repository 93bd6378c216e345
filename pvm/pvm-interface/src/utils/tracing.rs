use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Later calls are no-ops, so tests can call it freely.
pub fn setup_tracing() {
    let fmt_layer = fmt::layer().with_target(false);
    let sub = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt_layer);
    let _ = set_global_default(sub);
}
