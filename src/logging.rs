use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a stderr subscriber for embedding binaries and tests.
///
/// The core itself only emits `tracing` events; it never writes files, so
/// there is no rolling appender here. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
